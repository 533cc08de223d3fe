#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Parser for the subset of Python accepted by `ast.literal_eval`.

use peg::{error::ParseError, str::LineCol};

use super::value::Value;

peg::parser! {
    /// Grammar for Python literal expressions as printed by `print(obj)`.
    pub grammar python_literal() for str {
        /// optional whitespace
        rule _ = quiet!{[' ' | '\t' | '\n' | '\r']*}

        /// characters that may continue an identifier
        rule ident_char() = ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']

        /// a single hex digit
        rule hex() = ['0'..='9' | 'a'..='f' | 'A'..='F']

        /// decimal digits with optional `_` separators
        rule digits() = ['0'..='9'] ("_"? ['0'..='9'])*

        /// exponent part of a float
        rule exponent() = ['e' | 'E'] ['+' | '-']? digits()

        rule none() -> Value
            = "None" !ident_char() { Value::None }

        rule boolean() -> Value
            = "True" !ident_char() { Value::Bool(true) }
            / "False" !ident_char() { Value::Bool(false) }

        rule float_text() -> &'input str
            = $(['+' | '-']? (digits() "." digits()? exponent()? / "." digits() exponent()? / digits() exponent()))

        rule int_text() -> &'input str
            = $(['+' | '-']? digits())

        rule number() -> Value
            = n:float_text() !ident_char() {?
                n.replace('_', "").parse::<f64>().map(Value::Float).or(Err("float"))
            }
            / n:int_text() !ident_char() {?
                n.replace('_', "").parse::<i64>().map(Value::Int).or(Err("64-bit integer"))
            }

        /// turns hex digits into a char
        rule code_point(h: &'input str) -> char
            = {?
                u32::from_str_radix(h, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or("valid code point")
            }

        rule escape() -> char
            = "\\n" { '\n' }
            / "\\t" { '\t' }
            / "\\r" { '\r' }
            / "\\0" { '\0' }
            / "\\\\" { '\\' }
            / "\\'" { '\'' }
            / "\\\"" { '"' }
            / "\\x" h:$(hex() hex()) c:code_point(h) { c }
            / "\\u" h:$(hex() hex() hex() hex()) c:code_point(h) { c }
            / "\\U" h:$(hex() hex() hex() hex() hex() hex() hex() hex()) c:code_point(h) { c }

        rule single_quoted() -> String
            = "'" cs:(escape() / [^ '\'' | '\\' | '\n'])* "'" { cs.into_iter().collect() }

        rule double_quoted() -> String
            = "\"" cs:(escape() / [^ '"' | '\\' | '\n'])* "\"" { cs.into_iter().collect() }

        rule string() -> Value
            = s:(single_quoted() / double_quoted()) { Value::Str(s) }

        /// one or more comma separated values, with an optional trailing comma
        rule elements() -> Vec<Value>
            = vs:(value() ++ ",") ","? { vs }

        rule list() -> Value
            = "[" _ "]" { Value::List(vec![]) }
            / "[" vs:elements() _ "]" { Value::List(vs) }

        rule tuple_or_group() -> Value
            = "(" _ ")" { Value::Tuple(vec![]) }
            / "(" v:value() ")" { v }
            / "(" vs:elements() _ ")" { Value::Tuple(vs) }

        rule pair() -> (Value, Value)
            = k:value() ":" v:value() { (k, v) }

        rule dict_or_set() -> Value
            = "{" _ "}" { Value::Dict(vec![]) }
            / "{" ps:(pair() ++ ",") ","? _ "}" { Value::dict(ps) }
            / "{" vs:elements() _ "}" { Value::set(vs) }

        rule item() -> Value
            = none()
            / boolean()
            / number()
            / string()
            / list()
            / tuple_or_group()
            / dict_or_set()

        /// a value with surrounding whitespace
        rule value() -> Value
            = _ v:item() _ { v }

        /// parses a complete literal; trailing input is an error
        pub rule literal() -> Value
            = v:value() ![_] { v }
    }
}

/// Parses `text` as a Python literal.
pub fn parse_literal(text: &str) -> Result<Value, ParseError<LineCol>> {
    python_literal::literal(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn scalars() {
        assert_eq!(parse_literal("None").unwrap(), Value::None);
        assert_eq!(parse_literal(" True ").unwrap(), Value::Bool(true));
        assert_eq!(parse_literal("-42").unwrap(), Value::Int(-42));
        assert_eq!(parse_literal("1_000").unwrap(), Value::Int(1000));
        assert_eq!(parse_literal("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(parse_literal("1e3").unwrap(), Value::Float(1000.0));
        assert_eq!(parse_literal(".5").unwrap(), Value::Float(0.5));
        assert_eq!(parse_literal("'a\\'b'").unwrap(), s("a'b"));
        assert_eq!(parse_literal("\"tab\\there\"").unwrap(), s("tab\there"));
        assert_eq!(parse_literal("'\\u00e9'").unwrap(), s("é"));
    }

    #[test]
    fn identifiers_are_not_literals() {
        assert!(parse_literal("Nonesuch").is_err());
        assert!(parse_literal("joined").is_err());
        assert!(parse_literal("12abc").is_err());
    }

    #[test]
    fn tuples_and_groups() {
        assert_eq!(parse_literal("()").unwrap(), Value::Tuple(vec![]));
        assert_eq!(parse_literal("(1)").unwrap(), Value::Int(1));
        assert_eq!(parse_literal("(1,)").unwrap(), Value::Tuple(vec![Value::Int(1)]));
        assert_eq!(
            parse_literal("( 1 , 'x' )").unwrap(),
            Value::Tuple(vec![Value::Int(1), s("x")])
        );
    }

    #[test]
    fn dicts_sets_and_lists() {
        assert_eq!(parse_literal("{}").unwrap(), Value::Dict(vec![]));
        assert_eq!(parse_literal("{1, 2, 2}").unwrap(), Value::Set(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(parse_literal("[1, 2,]").unwrap(), Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(
            parse_literal("{'a': [1], 'b': {'c': None}}").unwrap(),
            Value::Dict(vec![
                (s("a"), Value::List(vec![Value::Int(1)])),
                (s("b"), Value::Dict(vec![(s("c"), Value::None)])),
            ])
        );
    }

    #[test]
    fn printed_sorted_result() {
        let printed = "[('Alice', {'num_orders': 2, 'total_spent': 250}), ('Bob', {'num_orders': 1, 'total_spent': 200})]";
        let value = parse_literal(printed).unwrap();
        assert_eq!(value.to_string(), printed);
    }

    #[test]
    fn rejects_trailing_garbage_and_bare_commas() {
        assert!(parse_literal("[1, 2] extra").is_err());
        assert!(parse_literal("[,]").is_err());
        assert!(parse_literal("").is_err());
    }
}
