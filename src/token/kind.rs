//! The closed token taxonomy.
//!
//! Variants are grouped into contiguous sections (numbers, literals, keywords,
//! operators, delimiters, identifiers, markers) the same way the Python
//! source model this crate replaces grouped its token enum, but instead of
//! sentinel `*_Start`/`*_End` values bracketing each section we expose
//! `is_*` predicates computed by a `match`.

/// A single lexical category. See the module docs for the grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Lexer has not yet decided what this span is.
    Undetermined,
    Comment,
    SyntaxError,
    IndentError,

    // --- numbers ---
    NumberHexInt,
    NumberBinInt,
    NumberOctInt,
    NumberDecInt,
    NumberFloat,

    // --- literals (strings) ---
    LiteralDblQuote,
    LiteralSglQuote,
    LiteralBlockDblQuote,
    LiteralBlockSglQuote,

    // --- keywords ---
    KeywordClass,
    KeywordDef,
    KeywordImport,
    KeywordFrom,
    KeywordAs,
    KeywordYield,
    KeywordReturn,
    KeywordRaise,
    KeywordWith,
    KeywordGlobal,
    KeywordNonlocal,
    KeywordLambda,
    KeywordPass,
    KeywordAssert,
    KeywordDel,
    KeywordAsync,
    KeywordAwait,
    KeywordIf,
    KeywordElif,
    KeywordElse,
    KeywordFor,
    KeywordWhile,
    KeywordBreak,
    KeywordContinue,
    KeywordTry,
    KeywordExcept,
    KeywordFinally,

    // --- operators: arithmetic ---
    OperatorPlus,
    OperatorMinus,
    OperatorMul,
    OperatorExponential,
    OperatorDiv,
    OperatorFloorDiv,
    OperatorModulo,
    OperatorMatrixMul,

    // --- operators: bitwise ---
    OperatorBitShiftLeft,
    OperatorBitShiftRight,
    OperatorBitAnd,
    OperatorBitOr,
    OperatorBitXor,
    OperatorBitNot,

    // --- operators: assignment ---
    OperatorEqual,
    OperatorWalrus,
    OperatorPlusEqual,
    OperatorMinusEqual,
    OperatorMulEqual,
    OperatorDivEqual,
    OperatorModuloEqual,
    OperatorFloorDivEqual,
    OperatorExpoEqual,
    OperatorMatrixMulEqual,
    OperatorBitAndEqual,
    OperatorBitOrEqual,
    OperatorBitXorEqual,
    OperatorBitShiftRightEqual,
    OperatorBitShiftLeftEqual,

    // --- operators: comparison ---
    OperatorCompareEqual,
    OperatorNotEqual,
    OperatorLessEqual,
    OperatorMoreEqual,
    OperatorLess,
    OperatorMore,
    OperatorAnd,
    OperatorOr,
    OperatorNot,
    OperatorIs,
    OperatorIn,

    // --- operators: parameter markers ---
    OperatorVariableParam, // *args
    OperatorKeyWordParam,  // **kwargs

    // --- delimiters ---
    Delimiter,
    DelimiterOpenParen,
    DelimiterCloseParen,
    DelimiterOpenBracket,
    DelimiterCloseBracket,
    DelimiterOpenBrace,
    DelimiterCloseBrace,
    DelimiterPeriod,
    DelimiterComma,
    DelimiterColon,
    DelimiterSemiColon,
    DelimiterEllipsis,
    DelimiterArrowR,
    DelimiterBackSlash,
    DelimiterNewLine,
    DelimiterAt, // decorator '@' when not used as matrix-mul

    // --- identifiers ---
    IdentifierUnknown,
    IdentifierDefined,
    IdentifierSelf,
    IdentifierBuiltin,
    IdentifierModule,
    IdentifierModulePackage,
    IdentifierModuleAlias,
    IdentifierModuleGlob,
    IdentifierFunction,
    IdentifierMethod,
    IdentifierClass,
    IdentifierSuperMethod,
    IdentifierDefUnknown,
    IdentifierDecorator,
    IdentifierNone,
    IdentifierTrue,
    IdentifierFalse,
    IdentifierInvalid,

    // --- markers ---
    Indent,
    Dedent,
    MetaData,
}

impl TokenKind {
    pub fn is_number(self) -> bool {
        matches!(
            self,
            Self::NumberHexInt
                | Self::NumberBinInt
                | Self::NumberOctInt
                | Self::NumberDecInt
                | Self::NumberFloat
        )
    }

    pub fn is_string_literal(self) -> bool {
        matches!(
            self,
            Self::LiteralDblQuote
                | Self::LiteralSglQuote
                | Self::LiteralBlockDblQuote
                | Self::LiteralBlockSglQuote
        )
    }

    pub fn is_multiline_literal(self) -> bool {
        matches!(self, Self::LiteralBlockDblQuote | Self::LiteralBlockSglQuote)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::KeywordClass
                | Self::KeywordDef
                | Self::KeywordImport
                | Self::KeywordFrom
                | Self::KeywordAs
                | Self::KeywordYield
                | Self::KeywordReturn
                | Self::KeywordRaise
                | Self::KeywordWith
                | Self::KeywordGlobal
                | Self::KeywordNonlocal
                | Self::KeywordLambda
                | Self::KeywordPass
                | Self::KeywordAssert
                | Self::KeywordDel
                | Self::KeywordAsync
                | Self::KeywordAwait
                | Self::KeywordIf
                | Self::KeywordElif
                | Self::KeywordElse
                | Self::KeywordFor
                | Self::KeywordWhile
                | Self::KeywordBreak
                | Self::KeywordContinue
                | Self::KeywordTry
                | Self::KeywordExcept
                | Self::KeywordFinally
        )
    }

    pub fn is_operator(self) -> bool {
        matches!(
            self,
            Self::OperatorPlus
                | Self::OperatorMinus
                | Self::OperatorMul
                | Self::OperatorExponential
                | Self::OperatorDiv
                | Self::OperatorFloorDiv
                | Self::OperatorModulo
                | Self::OperatorMatrixMul
                | Self::OperatorBitShiftLeft
                | Self::OperatorBitShiftRight
                | Self::OperatorBitAnd
                | Self::OperatorBitOr
                | Self::OperatorBitXor
                | Self::OperatorBitNot
                | Self::OperatorEqual
                | Self::OperatorWalrus
                | Self::OperatorPlusEqual
                | Self::OperatorMinusEqual
                | Self::OperatorMulEqual
                | Self::OperatorDivEqual
                | Self::OperatorModuloEqual
                | Self::OperatorFloorDivEqual
                | Self::OperatorExpoEqual
                | Self::OperatorMatrixMulEqual
                | Self::OperatorBitAndEqual
                | Self::OperatorBitOrEqual
                | Self::OperatorBitXorEqual
                | Self::OperatorBitShiftRightEqual
                | Self::OperatorBitShiftLeftEqual
                | Self::OperatorCompareEqual
                | Self::OperatorNotEqual
                | Self::OperatorLessEqual
                | Self::OperatorMoreEqual
                | Self::OperatorLess
                | Self::OperatorMore
                | Self::OperatorAnd
                | Self::OperatorOr
                | Self::OperatorNot
                | Self::OperatorIs
                | Self::OperatorIn
                | Self::OperatorVariableParam
                | Self::OperatorKeyWordParam
        )
    }

    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            Self::Delimiter
                | Self::DelimiterOpenParen
                | Self::DelimiterCloseParen
                | Self::DelimiterOpenBracket
                | Self::DelimiterCloseBracket
                | Self::DelimiterOpenBrace
                | Self::DelimiterCloseBrace
                | Self::DelimiterPeriod
                | Self::DelimiterComma
                | Self::DelimiterColon
                | Self::DelimiterSemiColon
                | Self::DelimiterEllipsis
                | Self::DelimiterArrowR
                | Self::DelimiterBackSlash
                | Self::DelimiterNewLine
                | Self::DelimiterAt
        )
    }

    pub fn is_identifier(self) -> bool {
        matches!(
            self,
            Self::IdentifierUnknown
                | Self::IdentifierDefined
                | Self::IdentifierSelf
                | Self::IdentifierBuiltin
                | Self::IdentifierModule
                | Self::IdentifierModulePackage
                | Self::IdentifierModuleAlias
                | Self::IdentifierModuleGlob
                | Self::IdentifierFunction
                | Self::IdentifierMethod
                | Self::IdentifierClass
                | Self::IdentifierSuperMethod
                | Self::IdentifierDefUnknown
                | Self::IdentifierDecorator
                | Self::IdentifierNone
                | Self::IdentifierTrue
                | Self::IdentifierFalse
                | Self::IdentifierInvalid
        )
    }

    /// Identifiers the semantic pass still owes a resolution decision.
    pub fn is_unresolved_identifier(self) -> bool {
        matches!(self, Self::IdentifierUnknown | Self::IdentifierDefUnknown)
    }

    /// Does this token mark a frame header keyword (`def`/`class`/`lambda`)?
    pub fn starts_frame(self) -> bool {
        matches!(self, Self::KeywordDef | Self::KeywordClass | Self::KeywordLambda)
    }

    pub fn is_marker(self) -> bool {
        matches!(
            self,
            Self::Indent | Self::Dedent | Self::MetaData | Self::Comment | Self::DelimiterNewLine
        )
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::SyntaxError | Self::IndentError | Self::IdentifierInvalid)
    }
}
