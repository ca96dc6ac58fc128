//! Business logic.
//!
//! > **Logic** is the "business (or domain) logic" of the application. The router will pull the
//! > necessary information out of the HTTP request, and call into this module as quickly as
//! > possible to do all the actual work.
//!
//! Every operation returns a `failure::Error` on failure. Errors the user caused are a
//! [`Refusal`]; anything else is an internal error.

pub mod auth;
pub mod bug;
pub mod category;
pub mod files;
pub mod food;
pub mod meal;
pub mod menu;
pub mod person;
pub mod tray;
pub mod user;
pub mod version;

use chrono::NaiveDate;
use failure::{Fail, Fallible};

/// An operation the user asked for that won't be carried out.
#[derive(Debug, Fail)]
pub enum Refusal {
    /// The submitted form was invalid. The message is meant to be shown next to the form.
    #[fail(display = "{}", _0)]
    Invalid(String),

    /// The thing being operated on doesn't exist.
    #[fail(display = "{}", _0)]
    NotFound(String),

    /// The user may not do this.
    #[fail(display = "You are not allowed to do that.")]
    Forbidden,
}

/// Returns the refusal behind an error, if it is one.
pub fn as_refusal(err: &failure::Error) -> Option<&Refusal> {
    err.downcast_ref::<Refusal>()
}

fn invalid<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(Refusal::Invalid(msg.into()).into())
}

fn not_found<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(Refusal::NotFound(msg.into()).into())
}

/// Requires that a row looked up by ID exist.
fn found<T>(value: Option<T>, kind: &str, id: i32) -> Fallible<T> {
    match value {
        Some(value) => Ok(value),
        None => not_found(format!("{} id {} doesn't exist.", kind, id)),
    }
}

fn forbidden<T>() -> Fallible<T> {
    Err(Refusal::Forbidden.into())
}

/// Requires that a form field be filled in, returning it trimmed.
fn required<'a>(value: &'a str, msg: &str) -> Fallible<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        invalid(msg)
    } else {
        Ok(value)
    }
}

/// Parses the ID of a selected option.
fn parse_id(value: &str, msg: &str) -> Fallible<i32> {
    value.trim().parse().or_else(|_| invalid(msg))
}

/// Parses a `YYYY-MM-DD` date.
fn parse_date(value: &str, msg: &str) -> Fallible<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").or_else(|_| invalid(msg))
}

/// Parses a strictly positive quantity.
fn parse_quantity(value: &str) -> Fallible<i32> {
    let quantity = required(value, "You must enter a quantity.")?;
    match quantity.parse::<i32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => invalid("You must enter a valid quantity."),
    }
}

/// HTML only submits a checkbox when it is checked.
fn checked(value: &Option<String>) -> bool {
    match value.as_ref().map(|s| s.trim()) {
        None | Some("") | Some("0") | Some("false") | Some("off") => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{as_refusal, checked, found, parse_date, parse_quantity, required, Refusal};

    fn message(err: failure::Error) -> String {
        match as_refusal(&err) {
            Some(Refusal::Invalid(msg)) => msg.clone(),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn required_trims() {
        assert_eq!(required("  soup ", "no").unwrap(), "soup");
        assert_eq!(message(required("   ", "Name is required.").unwrap_err()), "Name is required.");
    }

    #[test]
    fn dates_must_be_iso() {
        assert!(parse_date("1991-08-27", "bad").is_ok());
        assert_eq!(message(parse_date("19999991-08-27", "bad").unwrap_err()), "bad");
        assert_eq!(message(parse_date("", "bad").unwrap_err()), "bad");
    }

    #[test]
    fn quantities_are_positive() {
        assert_eq!(parse_quantity("250").unwrap(), 250);
        assert_eq!(
            message(parse_quantity("").unwrap_err()),
            "You must enter a quantity."
        );
        assert_eq!(
            message(parse_quantity("-3").unwrap_err()),
            "You must enter a valid quantity."
        );
        assert_eq!(
            message(parse_quantity("lots").unwrap_err()),
            "You must enter a valid quantity."
        );
    }

    #[test]
    fn checkboxes() {
        assert!(checked(&Some("1".to_owned())));
        assert!(checked(&Some("on".to_owned())));
        assert!(!checked(&Some("0".to_owned())));
        assert!(!checked(&None));
    }

    #[test]
    fn not_found_message() {
        let err = found(None::<()>, "Person", 25).unwrap_err();
        match as_refusal(&err) {
            Some(Refusal::NotFound(msg)) => assert_eq!(msg, "Person id 25 doesn't exist."),
            other => panic!("expected a missing row, got {:?}", other),
        }
        assert_eq!(found(Some(3), "Person", 25).unwrap(), 3);
    }
}
