use crate::{
    filter::{FieldRef, FilterExpr, TestOp, error::FilterError},
    records::field::ContactField,
};
use pest::{Parser, error::LineColLocation, iterators::Pair};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "filter/query.pest"]
struct QueryParser;

/// Field name that matches against every text field of a record.
const ANY_FIELD: &str = "x-evolution-any-field";

pub(crate) fn parse(input: &str) -> Result<FilterExpr, FilterError> {
    let mut pairs = QueryParser::parse(Rule::query, input).map_err(from_pest_error)?;

    let expr = pairs
        .next()
        .and_then(|query| query.into_inner().next())
        .ok_or_else(|| FilterError::Syntax {
            message: "empty query".to_string(),
            line: 1,
            column: 1,
        })?;

    build_expr(expr)
}

fn from_pest_error(err: pest::error::Error<Rule>) -> FilterError {
    let (line, column) = match err.line_col {
        LineColLocation::Pos((l, c)) => (l, c),
        LineColLocation::Span((l, c), _) => (l, c),
    };

    FilterError::Syntax {
        message: format!("{}", err.variant),
        line,
        column,
    }
}

fn build_expr(pair: Pair<Rule>) -> Result<FilterExpr, FilterError> {
    // `expr` always wraps exactly one form or constant
    let inner = match pair.as_rule() {
        Rule::expr => match pair.into_inner().next() {
            Some(inner) => inner,
            None => return Ok(FilterExpr::Const(true)),
        },
        _ => pair,
    };

    match inner.as_rule() {
        Rule::constant => Ok(FilterExpr::Const(inner.as_str() == "#t")),
        Rule::and_form => Ok(FilterExpr::And(
            inner.into_inner().map(build_expr).collect::<Result<_, _>>()?,
        )),
        Rule::or_form => Ok(FilterExpr::Or(
            inner.into_inner().map(build_expr).collect::<Result<_, _>>()?,
        )),
        Rule::not_form => {
            let operand = inner
                .into_inner()
                .next()
                .map(build_expr)
                .transpose()?
                .unwrap_or(FilterExpr::Const(true));
            Ok(FilterExpr::Not(Box::new(operand)))
        }
        Rule::exists_form => {
            let field = inner.into_inner().next().map(unquote).unwrap_or_default();
            Ok(FilterExpr::Exists(field_ref(&field)?))
        }
        Rule::test_form => {
            let mut parts = inner.into_inner();
            let op = match parts.next().map(|p| p.as_str()) {
                Some("is") => TestOp::Is,
                Some("contains") => TestOp::Contains,
                Some("beginswith") => TestOp::BeginsWith,
                _ => TestOp::EndsWith,
            };
            let field = parts.next().map(unquote).unwrap_or_default();
            let value = parts.next().map(unquote).unwrap_or_default();
            Ok(FilterExpr::Test {
                op,
                field: field_ref(&field)?,
                value,
            })
        }
        other => Err(FilterError::Syntax {
            message: format!("unexpected {other:?}"),
            line: 1,
            column: 1,
        }),
    }
}

fn unquote(pair: Pair<Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default();

    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for ch in raw.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    out
}

fn field_ref(name: &str) -> Result<FieldRef, FilterError> {
    if name == ANY_FIELD {
        return Ok(FieldRef::Any);
    }
    name.parse::<ContactField>()
        .map(FieldRef::Field)
        .map_err(|_| FilterError::UnknownField(name.to_string()))
}
