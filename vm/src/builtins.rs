//! Fast-call builtin ids.
//!
//! The compiler stores these ids as the immediate operand of `FASTCALL`; the
//! runtime dispatches on the same numbers. Ids are stable: new entries are
//! only ever appended.

/// Raw operand meaning "no fast path for this call site".
pub const NO_FAST_CALL: i32 = -1;

macro_rules! builtin_functions {
    ($($variant:ident = $id:literal => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum BuiltinFunction {
            $($variant = $id,)*
        }

        impl BuiltinFunction {
            pub const ALL: &'static [BuiltinFunction] = &[$(BuiltinFunction::$variant,)*];

            pub fn from_u8(id: u8) -> Option<Self> {
                match id {
                    $($id => Some(BuiltinFunction::$variant),)*
                    _ => None,
                }
            }

            /// Qualified library name, as written at a call site.
            pub fn name(self) -> &'static str {
                match self {
                    $(BuiltinFunction::$variant => $name,)*
                }
            }
        }
    };
}

builtin_functions! {
    Assert = 1 => "assert",

    MathAbs = 2 => "math.abs",
    MathAcos = 3 => "math.acos",
    MathAsin = 4 => "math.asin",
    MathAtan2 = 5 => "math.atan2",
    MathAtan = 6 => "math.atan",
    MathCeil = 7 => "math.ceil",
    MathCosh = 8 => "math.cosh",
    MathCos = 9 => "math.cos",
    MathDeg = 10 => "math.deg",
    MathExp = 11 => "math.exp",
    MathFloor = 12 => "math.floor",
    MathFmod = 13 => "math.fmod",
    MathFrexp = 14 => "math.frexp",
    MathLdexp = 15 => "math.ldexp",
    MathLog10 = 16 => "math.log10",
    MathLog = 17 => "math.log",
    MathMax = 18 => "math.max",
    MathMin = 19 => "math.min",
    MathModf = 20 => "math.modf",
    MathPow = 21 => "math.pow",
    MathRad = 22 => "math.rad",
    MathSinh = 23 => "math.sinh",
    MathSin = 24 => "math.sin",
    MathSqrt = 25 => "math.sqrt",
    MathTanh = 26 => "math.tanh",
    MathTan = 27 => "math.tan",

    Bit32Arshift = 28 => "bit32.arshift",
    Bit32Band = 29 => "bit32.band",
    Bit32Bnot = 30 => "bit32.bnot",
    Bit32Bor = 31 => "bit32.bor",
    Bit32Bxor = 32 => "bit32.bxor",
    Bit32Btest = 33 => "bit32.btest",
    Bit32Extract = 34 => "bit32.extract",
    Bit32Lrotate = 35 => "bit32.lrotate",
    Bit32Lshift = 36 => "bit32.lshift",
    Bit32Replace = 37 => "bit32.replace",
    Bit32Rrotate = 38 => "bit32.rrotate",
    Bit32Rshift = 39 => "bit32.rshift",

    Type = 40 => "type",
    StringByte = 41 => "string.byte",
    StringChar = 42 => "string.char",
    StringLen = 43 => "string.len",
    Typeof = 44 => "typeof",
    StringSub = 45 => "string.sub",

    MathClamp = 46 => "math.clamp",
    MathSign = 47 => "math.sign",
    MathRound = 48 => "math.round",

    Rawset = 49 => "rawset",
    Rawget = 50 => "rawget",
    Rawequal = 51 => "rawequal",

    TableInsert = 52 => "table.insert",
    TableUnpack = 53 => "table.unpack",

    Vector = 54 => "vector",

    Bit32Countlz = 55 => "bit32.countlz",
    Bit32Countrz = 56 => "bit32.countrz",

    SelectVararg = 57 => "select",

    Wait = 58 => "wait",

    MathApproximately = 59 => "math.approximately",
    MathCbrt = 60 => "math.cbrt",
    MathClassify = 61 => "math.classify",
    MathCopysign = 62 => "math.copysign",
    MathEps = 63 => "math.eps",
    MathErf = 64 => "math.erf",
    MathErfc = 65 => "math.erfc",
    MathExp2 = 66 => "math.exp2",
    MathExpm1 = 67 => "math.expm1",
    MathFade = 68 => "math.fade",
    MathFdim = 69 => "math.fdim",
    MathFma = 70 => "math.fma",
    MathFuzzyEq = 71 => "math.fuzzyeq",
    MathFuzzyNe = 72 => "math.fuzzyne",
    MathFuzzyGt = 73 => "math.fuzzygt",
    MathFuzzyGe = 74 => "math.fuzzyge",
    MathFuzzyLt = 75 => "math.fuzzylt",
    MathFuzzyLe = 76 => "math.fuzzyle",
    MathGrad = 77 => "math.grad",
    MathHypot = 78 => "math.hypot",
    MathIlogb = 79 => "math.ilogb",
    MathIsinf = 80 => "math.isinf",
    MathIsfinite = 81 => "math.isfinite",
    MathIsnormal = 82 => "math.isnormal",
    MathIsnan = 83 => "math.isnan",
    MathIsunordered = 84 => "math.isunordered",
    MathLerp = 85 => "math.lerp",
    MathLgamma = 86 => "math.lgamma",
    MathLog1p = 87 => "math.log1p",
    MathLogb = 88 => "math.logb",
    MathLog2 = 89 => "math.log2",
    MathNexttoward = 90 => "math.nexttoward",
    MathRemainder = 91 => "math.remainder",
    MathRemquo = 92 => "math.remquo",
    MathRep = 93 => "math.rep",
    MathRoot = 94 => "math.root",
    MathScalbn = 95 => "math.scalbn",
    MathSignbit = 96 => "math.signbit",
    MathTgamma = 97 => "math.tgamma",
    MathTointeger = 98 => "math.tointeger",
    MathTrunc = 99 => "math.trunc",
    MathType = 100 => "math.type",
    MathUlt = 101 => "math.ult",

    StringTrim = 102 => "string.trim",
    StringTrimStart = 103 => "string.trimstart",
    StringTrimEnd = 104 => "string.trimend",
    StringIndex = 105 => "string.index",

    TableIsempty = 106 => "table.isempty",
    TableFirst = 107 => "table.first",

    CprRequest = 108 => "cpr.request",
    CprGet = 109 => "cpr.get",
    CprPost = 110 => "cpr.post",
    CprPatch = 111 => "cpr.patch",
    CprPut = 112 => "cpr.put",
    CprDelete = 113 => "cpr.delete",
    CprOptions = 114 => "cpr.options",
    CprHead = 115 => "cpr.head",

    JsonEncode = 116 => "json.encode",
    JsonDecode = 117 => "json.decode",
    Base64Encode = 118 => "base64.encode",
    Base64Decode = 119 => "base64.decode",
}

impl BuiltinFunction {
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Raw operand form: the id, or `NO_FAST_CALL`.
    #[inline]
    pub fn raw(builtin: Option<BuiltinFunction>) -> i32 {
        builtin.map_or(NO_FAST_CALL, |b| b.as_u8() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for &b in BuiltinFunction::ALL {
            assert!(seen.insert(b.as_u8()), "duplicate id {}", b.as_u8());
            assert_eq!(BuiltinFunction::from_u8(b.as_u8()), Some(b));
        }
        assert_eq!(BuiltinFunction::from_u8(0), None);
        assert_eq!(BuiltinFunction::from_u8(200), None);
    }

    #[test]
    fn test_core_ids_are_stable() {
        assert_eq!(BuiltinFunction::Assert.as_u8(), 1);
        assert_eq!(BuiltinFunction::MathAbs.as_u8(), 2);
        assert_eq!(BuiltinFunction::MathSqrt.as_u8(), 25);
        assert_eq!(BuiltinFunction::Type.as_u8(), 40);
        assert_eq!(BuiltinFunction::TableInsert.as_u8(), 52);
        assert_eq!(BuiltinFunction::Vector.as_u8(), 54);
        assert_eq!(BuiltinFunction::SelectVararg.as_u8(), 57);
    }

    #[test]
    fn test_raw_sentinel() {
        assert_eq!(BuiltinFunction::raw(None), NO_FAST_CALL);
        assert_eq!(BuiltinFunction::raw(Some(BuiltinFunction::MathFloor)), 12);
    }
}
