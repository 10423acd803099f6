// SPDX-License-Identifier: Apache-2.0

//! Parser for the ISCAS `.bench` netlist description language.
//!
//! The accepted statements are:
//!
//! ```text
//! # comment
//! INPUT(a)
//! OUTPUT(y)
//! y = NAND(a, b)
//! ```
//!
//! The parser only produces structural records; gate type strings are kept
//! verbatim and interpreted when the [`crate::netlist::Netlist`] is built.

use std::collections::HashSet;

#[derive(Debug, PartialEq, Eq)]
pub struct ParseError {
    msg: String,
}

impl ParseError {
    fn new_with_pos(msg: String, lineno: usize, col: usize) -> Self {
        Self {
            msg: format!("{} at line {}, column {}", msg, lineno, col),
        }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParseError: {}", self.msg)
    }
}

impl std::error::Error for ParseError {}

/// A gate as written in the source, before fanout expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGate {
    pub kind: String,
    pub operands: Vec<String>,
}

/// Structural record produced by the parser.
///
/// `gates` is kept in declaration order; that order drives fanout stub
/// numbering downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNetlist {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub gates: Vec<(String, RawGate)>,
}

struct LineParser<'a> {
    line: &'a str,
    lineno: usize,
    pos: usize,
}

fn is_signal_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | ',' | '=' | '#')
}

impl<'a> LineParser<'a> {
    fn new(line: &'a str, lineno: usize) -> Self {
        Self {
            line,
            lineno,
            pos: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }

    fn drop_ws(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn try_drop(&mut self, tok: &str) -> bool {
        self.drop_ws();
        if self.rest().starts_with(tok) {
            self.pos += tok.len();
            true
        } else {
            false
        }
    }

    fn err(&self, msg: &str) -> ParseError {
        let col = self.line[..self.pos].chars().count() + 1;
        ParseError::new_with_pos(msg.to_string(), self.lineno, col)
    }

    fn drop_or_error(&mut self, tok: &str) -> Result<(), ParseError> {
        if self.try_drop(tok) {
            Ok(())
        } else {
            let got: String = self.rest().chars().take(tok.len().max(1)).collect();
            Err(self.err(&format!("expected '{}' got '{}'", tok, got)))
        }
    }

    fn parse_signal(&mut self) -> Result<&'a str, ParseError> {
        self.drop_ws();
        let start = self.pos;
        while let Some(c) = self.rest().chars().next() {
            if is_signal_char(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return match self.rest().chars().next() {
                Some(c) => Err(self.err(&format!("expected signal name, got '{}'", c))),
                None => Err(self.err("expected signal name, got end of line")),
            };
        }
        Ok(&self.line[start..self.pos])
    }

    /// Parses `( a, b, ... )` and returns the operand names.
    fn parse_operand_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.drop_or_error("(")?;
        let mut operands = vec![self.parse_signal()?.to_string()];
        while self.try_drop(",") {
            operands.push(self.parse_signal()?.to_string());
        }
        self.drop_or_error(")")?;
        Ok(operands)
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.drop_ws();
        if self.rest().is_empty() {
            Ok(())
        } else {
            Err(self.err(&format!("unexpected trailing text '{}'", self.rest())))
        }
    }

    /// Parses `KEYWORD(name)` if the line starts with `keyword` followed by an
    /// opening paren.
    fn try_parse_port(&mut self, keyword: &str) -> Result<Option<&'a str>, ParseError> {
        let saved = self.pos;
        if !self.try_drop(keyword) {
            return Ok(None);
        }
        self.drop_ws();
        if !self.rest().starts_with('(') {
            self.pos = saved;
            return Ok(None);
        }
        self.drop_or_error("(")?;
        let name = self.parse_signal()?;
        self.drop_or_error(")")?;
        self.expect_end()?;
        Ok(Some(name))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parses the text of a `.bench` file.
pub fn parse_bench(text: &str) -> Result<RawNetlist, ParseError> {
    let mut netlist = RawNetlist::default();
    let mut seen_inputs: HashSet<String> = HashSet::new();
    let mut seen_outputs: HashSet<String> = HashSet::new();
    let mut seen_gates: HashSet<String> = HashSet::new();

    for (i, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line);
        if line.trim().is_empty() {
            continue;
        }
        let mut p = LineParser::new(line, i + 1);

        if let Some(name) = p.try_parse_port("INPUT")? {
            if !seen_inputs.insert(name.to_string()) {
                return Err(p.err(&format!("duplicate INPUT '{}'", name)));
            }
            netlist.inputs.push(name.to_string());
            continue;
        }
        if let Some(name) = p.try_parse_port("OUTPUT")? {
            if !seen_outputs.insert(name.to_string()) {
                return Err(p.err(&format!("duplicate OUTPUT '{}'", name)));
            }
            netlist.outputs.push(name.to_string());
            continue;
        }

        let gate_name = p.parse_signal()?;
        p.drop_or_error("=")?;
        let kind = p.parse_signal()?;
        let operands = p.parse_operand_list()?;
        p.expect_end()?;
        if !seen_gates.insert(gate_name.to_string()) {
            return Err(ParseError::new_with_pos(
                format!("gate '{}' is defined more than once", gate_name),
                i + 1,
                1,
            ));
        }
        log::trace!(
            "parsed gate {} = {}({})",
            gate_name,
            kind,
            operands.join(", ")
        );
        netlist.gates.push((
            gate_name.to_string(),
            RawGate {
                kind: kind.to_string(),
                operands,
            },
        ));
    }
    Ok(netlist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_small_circuit() {
        let text = "# two input and\nINPUT(1)\nINPUT(2)\n\nOUTPUT(G)\nG = AND(1, 2)\n";
        let netlist = parse_bench(text).unwrap();
        assert_eq!(netlist.inputs, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(netlist.outputs, vec!["G".to_string()]);
        assert_eq!(
            netlist.gates,
            vec![(
                "G".to_string(),
                RawGate {
                    kind: "AND".to_string(),
                    operands: vec!["1".to_string(), "2".to_string()],
                }
            )]
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_trailing_comments() {
        let text = "  INPUT ( a )  # primary\nOUTPUT(y)\n  y=NOR( a ,a)   # self fanout\n";
        let netlist = parse_bench(text).unwrap();
        assert_eq!(netlist.inputs, vec!["a".to_string()]);
        assert_eq!(
            netlist.gates[0].1.operands,
            vec!["a".to_string(), "a".to_string()]
        );
        assert_eq!(netlist.gates[0].1.kind, "NOR");
    }

    #[test]
    fn test_gate_type_is_kept_verbatim() {
        let netlist = parse_bench("INPUT(a)\nOUTPUT(y)\ny = dff(a)\n").unwrap();
        assert_eq!(netlist.gates[0].1.kind, "dff");
    }

    #[test]
    fn test_gate_named_like_keyword() {
        let netlist = parse_bench("INPUT(a)\nOUTPUT(INPUTX)\nINPUTX = NOT(a)\n").unwrap();
        assert_eq!(netlist.gates[0].0, "INPUTX");
    }

    #[test]
    fn test_duplicate_gate_is_error() {
        let err = parse_bench("INPUT(a)\nx = NOT(a)\nx = BUFF(a)\n").unwrap_err();
        assert!(err.message().contains("defined more than once"), "{}", err);
        assert!(err.message().contains("line 3"), "{}", err);
    }

    #[test]
    fn test_missing_paren_reports_position() {
        let err = parse_bench("INPUT(a)\ny = AND(a, b\n").unwrap_err();
        assert_eq!(
            err.message(),
            "expected ')' got '' at line 2, column 13"
        );
    }

    #[test]
    fn test_empty_operand_list_is_error() {
        let err = parse_bench("y = AND()\n").unwrap_err();
        assert!(err.message().contains("expected signal name"), "{}", err);
    }

    #[test]
    fn test_trailing_text_is_error() {
        let err = parse_bench("INPUT(a) extra\n").unwrap_err();
        assert!(err.message().contains("unexpected trailing text"), "{}", err);
    }
}
