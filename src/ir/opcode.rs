//! Comparison predicates and binary opcodes as closed enumerations.
//!
//! Both tables follow the LLVM numbering so that instrumented code and the
//! runtime agree on the integer carried through the hook ABI. Codes without a
//! counterpart end up in an explicit `Unknown` variant instead of a silent
//! default.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Predicate {
    FcmpFalse,
    FcmpOeq,
    FcmpOgt,
    FcmpOge,
    FcmpOlt,
    FcmpOle,
    FcmpOne,
    FcmpOrd,
    FcmpUno,
    FcmpUeq,
    FcmpUgt,
    FcmpUge,
    FcmpUlt,
    FcmpUle,
    FcmpUne,
    FcmpTrue,
    IcmpEq,
    IcmpNe,
    IcmpUgt,
    IcmpUge,
    IcmpUlt,
    IcmpUle,
    IcmpSgt,
    IcmpSge,
    IcmpSlt,
    IcmpSle,
    Unknown(u32),
}

/// Relation a predicate denotes once signedness and ordering are ignored.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Relation {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Predicate {
    pub const ALL: [Predicate; 26] = [
        Predicate::FcmpFalse,
        Predicate::FcmpOeq,
        Predicate::FcmpOgt,
        Predicate::FcmpOge,
        Predicate::FcmpOlt,
        Predicate::FcmpOle,
        Predicate::FcmpOne,
        Predicate::FcmpOrd,
        Predicate::FcmpUno,
        Predicate::FcmpUeq,
        Predicate::FcmpUgt,
        Predicate::FcmpUge,
        Predicate::FcmpUlt,
        Predicate::FcmpUle,
        Predicate::FcmpUne,
        Predicate::FcmpTrue,
        Predicate::IcmpEq,
        Predicate::IcmpNe,
        Predicate::IcmpUgt,
        Predicate::IcmpUge,
        Predicate::IcmpUlt,
        Predicate::IcmpUle,
        Predicate::IcmpSgt,
        Predicate::IcmpSge,
        Predicate::IcmpSlt,
        Predicate::IcmpSle,
    ];

    #[rustfmt::skip]
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Predicate::FcmpFalse,
            1 => Predicate::FcmpOeq,
            2 => Predicate::FcmpOgt,
            3 => Predicate::FcmpOge,
            4 => Predicate::FcmpOlt,
            5 => Predicate::FcmpOle,
            6 => Predicate::FcmpOne,
            7 => Predicate::FcmpOrd,
            8 => Predicate::FcmpUno,
            9 => Predicate::FcmpUeq,
            10 => Predicate::FcmpUgt,
            11 => Predicate::FcmpUge,
            12 => Predicate::FcmpUlt,
            13 => Predicate::FcmpUle,
            14 => Predicate::FcmpUne,
            15 => Predicate::FcmpTrue,
            32 => Predicate::IcmpEq,
            33 => Predicate::IcmpNe,
            34 => Predicate::IcmpUgt,
            35 => Predicate::IcmpUge,
            36 => Predicate::IcmpUlt,
            37 => Predicate::IcmpUle,
            38 => Predicate::IcmpSgt,
            39 => Predicate::IcmpSge,
            40 => Predicate::IcmpSlt,
            41 => Predicate::IcmpSle,
            other => Predicate::Unknown(other),
        }
    }

    #[rustfmt::skip]
    pub fn code(&self) -> u32 {
        match *self {
            Predicate::FcmpFalse => 0,
            Predicate::FcmpOeq => 1,
            Predicate::FcmpOgt => 2,
            Predicate::FcmpOge => 3,
            Predicate::FcmpOlt => 4,
            Predicate::FcmpOle => 5,
            Predicate::FcmpOne => 6,
            Predicate::FcmpOrd => 7,
            Predicate::FcmpUno => 8,
            Predicate::FcmpUeq => 9,
            Predicate::FcmpUgt => 10,
            Predicate::FcmpUge => 11,
            Predicate::FcmpUlt => 12,
            Predicate::FcmpUle => 13,
            Predicate::FcmpUne => 14,
            Predicate::FcmpTrue => 15,
            Predicate::IcmpEq => 32,
            Predicate::IcmpNe => 33,
            Predicate::IcmpUgt => 34,
            Predicate::IcmpUge => 35,
            Predicate::IcmpUlt => 36,
            Predicate::IcmpUle => 37,
            Predicate::IcmpSgt => 38,
            Predicate::IcmpSge => 39,
            Predicate::IcmpSlt => 40,
            Predicate::IcmpSle => 41,
            Predicate::Unknown(code) => code,
        }
    }

    /// Signed and unsigned variants collapse onto one relation, as do the
    /// ordered and unordered floating point variants. `FcmpFalse`, `FcmpTrue`,
    /// `FcmpOrd` and `FcmpUno` have no relation and are treated as unknown.
    #[rustfmt::skip]
    pub fn relation(&self) -> Option<Relation> {
        match *self {
            Predicate::IcmpEq | Predicate::FcmpOeq | Predicate::FcmpUeq => Some(Relation::Eq),
            Predicate::IcmpNe | Predicate::FcmpOne | Predicate::FcmpUne => Some(Relation::Ne),
            Predicate::IcmpUgt | Predicate::IcmpSgt | Predicate::FcmpOgt | Predicate::FcmpUgt => Some(Relation::Gt),
            Predicate::IcmpUlt | Predicate::IcmpSlt | Predicate::FcmpOlt | Predicate::FcmpUlt => Some(Relation::Lt),
            Predicate::IcmpUge | Predicate::IcmpSge | Predicate::FcmpOge | Predicate::FcmpUge => Some(Relation::Ge),
            Predicate::IcmpUle | Predicate::IcmpSle | Predicate::FcmpOle | Predicate::FcmpUle => Some(Relation::Le),
            Predicate::FcmpFalse
            | Predicate::FcmpOrd
            | Predicate::FcmpUno
            | Predicate::FcmpTrue
            | Predicate::Unknown(_) => None,
        }
    }

    pub fn is_float(&self) -> bool {
        self.code() <= 15
    }
}

impl fmt::Display for Predicate {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Unknown(code) => write!(f, "pred<{}>", code),
            Predicate::FcmpFalse => write!(f, "false"),
            Predicate::FcmpTrue => write!(f, "true"),
            Predicate::FcmpOrd => write!(f, "ord"),
            Predicate::FcmpUno => write!(f, "uno"),
            known => {
                let prefix = match known {
                    Predicate::FcmpOeq | Predicate::FcmpOgt | Predicate::FcmpOge
                    | Predicate::FcmpOlt | Predicate::FcmpOle | Predicate::FcmpOne => "o",
                    Predicate::FcmpUeq | Predicate::FcmpUgt | Predicate::FcmpUge
                    | Predicate::FcmpUlt | Predicate::FcmpUle | Predicate::FcmpUne
                    | Predicate::IcmpUgt | Predicate::IcmpUge | Predicate::IcmpUlt
                    | Predicate::IcmpUle => "u",
                    Predicate::IcmpSgt | Predicate::IcmpSge | Predicate::IcmpSlt
                    | Predicate::IcmpSle => "s",
                    _ => "",
                };
                let relation = match known.relation() {
                    Some(Relation::Eq) => "eq",
                    Some(Relation::Ne) => "ne",
                    Some(Relation::Gt) => "gt",
                    Some(Relation::Lt) => "lt",
                    Some(Relation::Ge) => "ge",
                    Some(Relation::Le) => "le",
                    None => "?",
                };
                write!(f, "{}{}", prefix, relation)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
    Unknown(u32),
}

impl BinaryOperator {
    pub const ALL: [BinaryOperator; 13] = [
        BinaryOperator::Add,
        BinaryOperator::Sub,
        BinaryOperator::Mul,
        BinaryOperator::UDiv,
        BinaryOperator::SDiv,
        BinaryOperator::URem,
        BinaryOperator::SRem,
        BinaryOperator::Shl,
        BinaryOperator::LShr,
        BinaryOperator::AShr,
        BinaryOperator::And,
        BinaryOperator::Or,
        BinaryOperator::Xor,
    ];

    pub fn from_code(code: u32) -> Self {
        match code {
            13 => BinaryOperator::Add,
            15 => BinaryOperator::Sub,
            17 => BinaryOperator::Mul,
            19 => BinaryOperator::UDiv,
            20 => BinaryOperator::SDiv,
            22 => BinaryOperator::URem,
            23 => BinaryOperator::SRem,
            25 => BinaryOperator::Shl,
            26 => BinaryOperator::LShr,
            27 => BinaryOperator::AShr,
            28 => BinaryOperator::And,
            29 => BinaryOperator::Or,
            30 => BinaryOperator::Xor,
            other => BinaryOperator::Unknown(other),
        }
    }

    pub fn code(&self) -> u32 {
        match *self {
            BinaryOperator::Add => 13,
            BinaryOperator::Sub => 15,
            BinaryOperator::Mul => 17,
            BinaryOperator::UDiv => 19,
            BinaryOperator::SDiv => 20,
            BinaryOperator::URem => 22,
            BinaryOperator::SRem => 23,
            BinaryOperator::Shl => 25,
            BinaryOperator::LShr => 26,
            BinaryOperator::AShr => 27,
            BinaryOperator::And => 28,
            BinaryOperator::Or => 29,
            BinaryOperator::Xor => 30,
            BinaryOperator::Unknown(code) => code,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::UDiv => "udiv",
            BinaryOperator::SDiv => "sdiv",
            BinaryOperator::URem => "urem",
            BinaryOperator::SRem => "srem",
            BinaryOperator::Shl => "shl",
            BinaryOperator::LShr => "lshr",
            BinaryOperator::AShr => "ashr",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Unknown(code) => return write!(f, "binop<{}>", code),
        };
        write!(f, "{}", name)
    }
}
