// src/format/directive.rs

/// Numeric family of a conversion letter. Float-family words are IEEE-754 bit
/// patterns and are reinterpreted before rendering; integer words are used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Float,
    Integer,
}

/// printf conversion letters understood on both sides of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// `e`
    Exp,
    /// `E`
    ExpUpper,
    /// `f`
    Fixed,
    /// `F`
    FixedUpper,
    /// `g`
    General,
    /// `G`
    GeneralUpper,
    /// `a`
    HexFloat,
    /// `A`
    HexFloatUpper,
    /// `d`
    Decimal,
    /// `i`
    Integer,
    /// `u`
    Unsigned,
    /// `o`
    Octal,
    /// `x`
    Hex,
    /// `X`
    HexUpper,
}

impl Conversion {
    pub fn from_letter(c: u32) -> Option<Self> {
        use Conversion::*;
        Some(match char::from_u32(c)? {
            'e' => Exp,
            'E' => ExpUpper,
            'f' => Fixed,
            'F' => FixedUpper,
            'g' => General,
            'G' => GeneralUpper,
            'a' => HexFloat,
            'A' => HexFloatUpper,
            'd' => Decimal,
            'i' => Integer,
            'u' => Unsigned,
            'o' => Octal,
            'x' => Hex,
            'X' => HexUpper,
            _ => return None,
        })
    }

    pub fn letter(self) -> char {
        use Conversion::*;
        match self {
            Exp => 'e',
            ExpUpper => 'E',
            Fixed => 'f',
            FixedUpper => 'F',
            General => 'g',
            GeneralUpper => 'G',
            HexFloat => 'a',
            HexFloatUpper => 'A',
            Decimal => 'd',
            Integer => 'i',
            Unsigned => 'u',
            Octal => 'o',
            Hex => 'x',
            HexUpper => 'X',
        }
    }

    pub fn family(self) -> Family {
        use Conversion::*;
        match self {
            Exp | ExpUpper | Fixed | FixedUpper | General | GeneralUpper | HexFloat
            | HexFloatUpper => Family::Float,
            Decimal | Integer | Unsigned | Octal | Hex | HexUpper => Family::Integer,
        }
    }

    pub fn is_upper(self) -> bool {
        self.letter().is_ascii_uppercase()
    }
}

/// One `%...` specifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatDirective {
    /// Flag, width, precision and length characters between `%` and the
    /// conversion letter, in source order, without the `^N` vector marker.
    pub flags: String,
    /// Number of consecutive words the directive consumes (1 for scalars).
    pub vector_width: u8,
    pub conversion: Conversion,
}

impl FormatDirective {
    pub fn family(&self) -> Family {
        self.conversion.family()
    }

    /// The directive as a plain printf template, e.g. `%5.2f` for `%5^3.2f`.
    pub fn template(&self) -> String {
        format!("%{}{}", self.flags, self.conversion.letter())
    }
}
