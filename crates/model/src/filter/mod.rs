//! Inclusion tests applied to records before they are ordered.
//!
//! A [`Filter`] is either a parsed query expression or an arbitrary
//! predicate closure. The cursor never looks inside it; it only asks
//! whether a record matches.

use crate::records::{field::ContactField, record::Record};
use std::{fmt, sync::Arc};

pub mod error;
mod parse;

pub use error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOp {
    Is,
    Contains,
    BeginsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef {
    Field(ContactField),
    /// Any text field of the record.
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    Const(bool),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
    Exists(FieldRef),
    Test {
        op: TestOp,
        field: FieldRef,
        value: String,
    },
}

impl FilterExpr {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            FilterExpr::Const(value) => *value,
            FilterExpr::And(exprs) => exprs.iter().all(|e| e.matches(record)),
            FilterExpr::Or(exprs) => exprs.iter().any(|e| e.matches(record)),
            FilterExpr::Not(expr) => !expr.matches(record),
            FilterExpr::Exists(field) => {
                values(record, *field).any(|v| !v.trim().is_empty())
            }
            FilterExpr::Test { op, field, value } => {
                let needle = value.to_lowercase();
                values(record, *field).any(|v| test(*op, &v.to_lowercase(), &needle))
            }
        }
    }
}

fn values(record: &Record, field: FieldRef) -> Box<dyn Iterator<Item = &str> + '_> {
    match field {
        FieldRef::Field(field) => Box::new(record.get(field).into_iter()),
        FieldRef::Any => Box::new(
            record
                .fields
                .iter()
                .filter(|(f, _)| f.is_text())
                .map(|(_, v)| v.as_str()),
        ),
    }
}

fn test(op: TestOp, haystack: &str, needle: &str) -> bool {
    match op {
        TestOp::Is => haystack == needle,
        TestOp::Contains => haystack.contains(needle),
        TestOp::BeginsWith => haystack.starts_with(needle),
        TestOp::EndsWith => haystack.ends_with(needle),
    }
}

type Predicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// A record inclusion test.
#[derive(Clone)]
pub enum Filter {
    Expr {
        expr: FilterExpr,
        source: Option<String>,
    },
    Predicate(Predicate),
}

impl Filter {
    /// Parse an s-expression query such as `(endswith "email" ".com")`.
    pub fn parse(query: &str) -> Result<Self, FilterError> {
        let expr = parse::parse(query)?;
        Ok(Filter::Expr {
            expr,
            source: Some(query.to_string()),
        })
    }

    pub fn expr(expr: FilterExpr) -> Self {
        Filter::Expr { expr, source: None }
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Expr { expr, .. } => expr.matches(record),
            Filter::Predicate(f) => f(record),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Expr {
                source: Some(source),
                ..
            } => write!(f, "Filter({source})"),
            Filter::Expr { expr, .. } => write!(f, "Filter({expr:?})"),
            Filter::Predicate(_) => f.write_str("Filter(<predicate>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(family: &str, email: Option<&str>) -> Record {
        let r = Record::new(family).with_field(ContactField::FamilyName, family);
        match email {
            Some(e) => r.with_field(ContactField::Email, e),
            None => r,
        }
    }

    #[test]
    fn endswith_is_case_insensitive() {
        let filter = Filter::parse(r#"(endswith "email" ".com")"#).unwrap();
        assert!(filter.matches(&contact("a", Some("A@EXAMPLE.COM"))));
        assert!(!filter.matches(&contact("b", Some("b@example.org"))));
        assert!(!filter.matches(&contact("c", None)));
    }

    #[test]
    fn boolean_forms_compose() {
        let filter = Filter::parse(
            r#"(and (exists "email") (not (beginswith "family_name" "b")))"#,
        )
        .unwrap();
        assert!(filter.matches(&contact("Caron", Some("c@x.com"))));
        assert!(!filter.matches(&contact("bad", Some("b@x.com"))));
        assert!(!filter.matches(&contact("Caron", None)));

        let either = Filter::parse(r#"(or (is "family_name" "bat") (contains "email" "@x"))"#)
            .unwrap();
        assert!(either.matches(&contact("BAT", None)));
        assert!(either.matches(&contact("zed", Some("z@x.org"))));
        assert!(!either.matches(&contact("zed", None)));
    }

    #[test]
    fn any_field_and_constants() {
        let any = Filter::parse(r#"(contains "x-evolution-any-field" "müll")"#).unwrap();
        assert!(any.matches(&contact("Müller", None)));
        assert!(Filter::parse("#t").unwrap().matches(&contact("x", None)));
        assert!(!Filter::parse("#f").unwrap().matches(&contact("x", None)));
    }

    #[test]
    fn escaped_quotes_in_values() {
        let filter = Filter::parse(r#"(is "nickname" "the \"one\"")"#).unwrap();
        let r = Record::new("n").with_field(ContactField::Nickname, "The \"One\"");
        assert!(filter.matches(&r));
    }

    #[test]
    fn rejects_unparsable_queries() {
        assert!(matches!(
            Filter::parse("(endswith \"email\""),
            Err(FilterError::Syntax { .. })
        ));
        assert!(matches!(
            Filter::parse("(frobnicate \"email\" \"x\")"),
            Err(FilterError::Syntax { .. })
        ));
        assert_eq!(
            Filter::parse(r#"(is "shoe_size" "9")"#).unwrap_err(),
            FilterError::UnknownField("shoe_size".to_string())
        );
    }

    #[test]
    fn predicate_filters_wrap_closures() {
        let filter = Filter::predicate(|r| r.uid.starts_with('s'));
        assert!(filter.matches(&Record::new("sorted-1")));
        assert!(!filter.matches(&Record::new("other")));
        assert_eq!(format!("{filter:?}"), "Filter(<predicate>)");
    }
}
