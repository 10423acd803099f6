// SPDX-License-Identifier: Apache-2.0

//! Boolean evaluation of the supported combinational gate kinds.

use serde::Serialize;

use crate::netlist::{Gate, SignalId};
use crate::sim::SignalValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    Not,
    Buff,
}

impl GateKind {
    pub const ALL: [GateKind; 8] = [
        GateKind::And,
        GateKind::Or,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Xnor,
        GateKind::Not,
        GateKind::Buff,
    ];

    /// Spelling used in `.bench` files.
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
            GateKind::Not => "NOT",
            GateKind::Buff => "BUFF",
        }
    }

    /// NOT and BUFF take exactly one operand; everything else takes two or
    /// more.
    pub fn is_unary(&self) -> bool {
        matches!(self, GateKind::Not | GateKind::Buff)
    }

    pub fn accepts_operand_count(&self, count: usize) -> bool {
        if self.is_unary() {
            count == 1
        } else {
            count >= 2
        }
    }

    /// Reduces the operand values according to the gate function.
    ///
    /// Unary kinds look only at the first value.
    pub fn apply<I: IntoIterator<Item = bool>>(&self, values: I) -> bool {
        let mut values = values.into_iter();
        match self {
            GateKind::And => values.all(|v| v),
            GateKind::Or => values.any(|v| v),
            GateKind::Nand => !values.all(|v| v),
            GateKind::Nor => !values.any(|v| v),
            GateKind::Xor => values.filter(|v| *v).count() % 2 == 1,
            GateKind::Xnor => values.filter(|v| *v).count() % 2 == 0,
            GateKind::Not => !values.next().unwrap_or(false),
            GateKind::Buff => values.next().unwrap_or(false),
        }
    }
}

impl std::str::FromStr for GateKind {
    type Err = String;

    /// Matching is case sensitive, as in the `.bench` format.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unrecognized gate kind: {}", s))
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The operand has not been assigned a value in the snapshot yet.
    MissingOperand(SignalId),
    ArityMismatch { kind: GateKind, got: usize },
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::MissingOperand(id) => {
                write!(f, "operand signal #{} has no value", id.index())
            }
            EvalError::ArityMismatch { kind, got } => {
                write!(f, "{} gate cannot take {} operand(s)", kind, got)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluates `gate` against the current signal snapshot.
///
/// Every operand must already have a value; a missing one means the netlist
/// or the schedule is broken, so it is reported rather than defaulted.
pub fn evaluate(gate: &Gate, values: &SignalValues) -> Result<bool, EvalError> {
    let kind = gate.kind();
    let operands = gate.operands();
    if !kind.accepts_operand_count(operands.len()) {
        return Err(EvalError::ArityMismatch {
            kind,
            got: operands.len(),
        });
    }
    let mut operand_values = Vec::with_capacity(operands.len());
    for operand in operands {
        match values.get(*operand) {
            Some(value) => operand_values.push(value),
            None => return Err(EvalError::MissingOperand(*operand)),
        }
    }
    Ok(kind.apply(operand_values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_netlist, AND2_BENCH};
    use test_case::test_case;

    #[test_case(GateKind::And, &[true, true, false], false; "and3 with a zero")]
    #[test_case(GateKind::And, &[true, true, true], true; "and3 all ones")]
    #[test_case(GateKind::Or, &[true, true, false], true; "or3")]
    #[test_case(GateKind::Or, &[false, false], false; "or2 zeros")]
    #[test_case(GateKind::Nand, &[true, true, false], true; "nand3")]
    #[test_case(GateKind::Nand, &[true, true], false; "nand2 ones")]
    #[test_case(GateKind::Nor, &[false, false, false], true; "nor3 zeros")]
    #[test_case(GateKind::Nor, &[false, true], false; "nor2")]
    #[test_case(GateKind::Xor, &[true, true, true], true; "xor3 odd")]
    #[test_case(GateKind::Xor, &[true, true], false; "xor2 even")]
    #[test_case(GateKind::Xnor, &[true, true, true], false; "xnor3 odd")]
    #[test_case(GateKind::Xnor, &[true, false, true, false], true; "xnor4 even")]
    #[test_case(GateKind::Not, &[true], false; "not")]
    #[test_case(GateKind::Buff, &[true], true; "buff")]
    fn test_apply(kind: GateKind, inputs: &[bool], want: bool) {
        assert_eq!(kind.apply(inputs.iter().copied()), want);
    }

    #[test]
    fn test_xnor_of_nothing_is_true() {
        assert!(GateKind::Xnor.apply(std::iter::empty()));
        assert!(!GateKind::Xor.apply(std::iter::empty()));
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert_eq!("NAND".parse::<GateKind>(), Ok(GateKind::Nand));
        assert_eq!("BUFF".parse::<GateKind>(), Ok(GateKind::Buff));
        assert!("nand".parse::<GateKind>().is_err());
        assert!("DFF".parse::<GateKind>().is_err());
    }

    #[test]
    fn test_operand_count_rules() {
        assert!(GateKind::Not.accepts_operand_count(1));
        assert!(!GateKind::Not.accepts_operand_count(2));
        assert!(!GateKind::And.accepts_operand_count(1));
        assert!(GateKind::And.accepts_operand_count(5));
    }

    #[test]
    fn test_unassigned_operand_is_reported() {
        let netlist = build_netlist(AND2_BENCH);
        let gate = netlist.gate(netlist.signal_id("G").unwrap()).unwrap();
        let first = gate.operands()[0];
        let second = gate.operands()[1];

        let mut values = SignalValues::new(netlist.signal_count());
        assert_eq!(
            evaluate(gate, &values),
            Err(EvalError::MissingOperand(first))
        );
        values.set(first, true);
        assert_eq!(
            evaluate(gate, &values),
            Err(EvalError::MissingOperand(second))
        );
        values.set(second, true);
        assert_eq!(evaluate(gate, &values), Ok(true));
    }
}
