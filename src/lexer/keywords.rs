//! The fixed keyword table, built once behind a [`once_cell::sync::Lazy`]
//! the same way the rest of this codebase avoids re-deriving static lookup
//! tables on every call (see `crates/why_lib`'s typechecker environment).

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::token::TokenKind;

pub(crate) static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("class", TokenKind::KeywordClass);
    m.insert("def", TokenKind::KeywordDef);
    m.insert("import", TokenKind::KeywordImport);
    m.insert("from", TokenKind::KeywordFrom);
    m.insert("as", TokenKind::KeywordAs);
    m.insert("yield", TokenKind::KeywordYield);
    m.insert("return", TokenKind::KeywordReturn);
    m.insert("raise", TokenKind::KeywordRaise);
    m.insert("with", TokenKind::KeywordWith);
    m.insert("global", TokenKind::KeywordGlobal);
    m.insert("nonlocal", TokenKind::KeywordNonlocal);
    m.insert("lambda", TokenKind::KeywordLambda);
    m.insert("pass", TokenKind::KeywordPass);
    m.insert("assert", TokenKind::KeywordAssert);
    m.insert("del", TokenKind::KeywordDel);
    m.insert("async", TokenKind::KeywordAsync);
    m.insert("await", TokenKind::KeywordAwait);
    m.insert("if", TokenKind::KeywordIf);
    m.insert("elif", TokenKind::KeywordElif);
    m.insert("else", TokenKind::KeywordElse);
    m.insert("for", TokenKind::KeywordFor);
    m.insert("while", TokenKind::KeywordWhile);
    m.insert("break", TokenKind::KeywordBreak);
    m.insert("continue", TokenKind::KeywordContinue);
    m.insert("try", TokenKind::KeywordTry);
    m.insert("except", TokenKind::KeywordExcept);
    m.insert("finally", TokenKind::KeywordFinally);
    m.insert("and", TokenKind::OperatorAnd);
    m.insert("or", TokenKind::OperatorOr);
    m.insert("not", TokenKind::OperatorNot);
    m.insert("is", TokenKind::OperatorIs);
    m.insert("in", TokenKind::OperatorIn);
    m.insert("None", TokenKind::IdentifierNone);
    m.insert("True", TokenKind::IdentifierTrue);
    m.insert("False", TokenKind::IdentifierFalse);
    m
});

/// Three-, two- and one-character operator/delimiter spellings, longest
/// match first. Checked in this order by [`super::scanner::Scanner`].
pub(crate) const OPERATORS_3: &[(&str, TokenKind)] = &[
    ("**=", TokenKind::OperatorExpoEqual),
    ("//=", TokenKind::OperatorFloorDivEqual),
    ("<<=", TokenKind::OperatorBitShiftLeftEqual),
    (">>=", TokenKind::OperatorBitShiftRightEqual),
    ("...", TokenKind::DelimiterEllipsis),
];

pub(crate) const OPERATORS_2: &[(&str, TokenKind)] = &[
    ("**", TokenKind::OperatorExponential),
    ("//", TokenKind::OperatorFloorDiv),
    ("<<", TokenKind::OperatorBitShiftLeft),
    (">>", TokenKind::OperatorBitShiftRight),
    ("<=", TokenKind::OperatorLessEqual),
    (">=", TokenKind::OperatorMoreEqual),
    ("==", TokenKind::OperatorCompareEqual),
    ("!=", TokenKind::OperatorNotEqual),
    ("+=", TokenKind::OperatorPlusEqual),
    ("-=", TokenKind::OperatorMinusEqual),
    ("*=", TokenKind::OperatorMulEqual),
    ("/=", TokenKind::OperatorDivEqual),
    ("%=", TokenKind::OperatorModuloEqual),
    ("&=", TokenKind::OperatorBitAndEqual),
    ("|=", TokenKind::OperatorBitOrEqual),
    ("^=", TokenKind::OperatorBitXorEqual),
    ("@=", TokenKind::OperatorMatrixMulEqual),
    (":=", TokenKind::OperatorWalrus),
    ("->", TokenKind::DelimiterArrowR),
];

pub(crate) const OPERATORS_1: &[(char, TokenKind)] = &[
    ('+', TokenKind::OperatorPlus),
    ('-', TokenKind::OperatorMinus),
    ('*', TokenKind::OperatorMul),
    ('/', TokenKind::OperatorDiv),
    ('%', TokenKind::OperatorModulo),
    ('<', TokenKind::OperatorLess),
    ('>', TokenKind::OperatorMore),
    ('=', TokenKind::OperatorEqual),
    ('&', TokenKind::OperatorBitAnd),
    ('|', TokenKind::OperatorBitOr),
    ('^', TokenKind::OperatorBitXor),
    ('~', TokenKind::OperatorBitNot),
    ('@', TokenKind::DelimiterAt),
    ('(', TokenKind::DelimiterOpenParen),
    (')', TokenKind::DelimiterCloseParen),
    ('[', TokenKind::DelimiterOpenBracket),
    (']', TokenKind::DelimiterCloseBracket),
    ('{', TokenKind::DelimiterOpenBrace),
    ('}', TokenKind::DelimiterCloseBrace),
    ('.', TokenKind::DelimiterPeriod),
    (',', TokenKind::DelimiterComma),
    (':', TokenKind::DelimiterColon),
    (';', TokenKind::DelimiterSemiColon),
    ('\\', TokenKind::DelimiterBackSlash),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_resolves_def_and_class() {
        assert_eq!(KEYWORDS.get("def"), Some(&TokenKind::KeywordDef));
        assert_eq!(KEYWORDS.get("class"), Some(&TokenKind::KeywordClass));
        assert_eq!(KEYWORDS.get("nope"), None);
    }
}
