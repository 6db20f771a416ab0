use http_client_instrumented::prelude::HttpResponse;

/// What a [Check] compares against the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckPredicate {
    /// The body must equal this text exactly, byte for byte and case sensitive.
    BodyEquals(String),
    /// The status code must equal this value.
    StatusIs(u16),
}

/// A named boolean assertion over a response.
///
/// Evaluating a check has no side effects, recording its outcome is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    name: String,
    predicate: CheckPredicate,
}

impl Check {
    pub fn new(name: impl Into<String>, predicate: CheckPredicate) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }

    pub fn body_equals(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::new(name, CheckPredicate::BodyEquals(expected.into()))
    }

    pub fn status_is(name: impl Into<String>, status: u16) -> Self {
        Self::new(name, CheckPredicate::StatusIs(status))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicate(&self) -> &CheckPredicate {
        &self.predicate
    }

    pub fn evaluate(&self, response: &HttpResponse) -> bool {
        match &self.predicate {
            CheckPredicate::BodyEquals(expected) => response.body.as_ref() == expected.as_bytes(),
            CheckPredicate::StatusIs(status) => response.status == *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_client_instrumented::prelude::Bytes;
    use std::collections::HashMap;

    fn raw_response(status: u16, body: &'static [u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from_static(body),
        }
    }

    fn response(status: u16, body: &'static str) -> HttpResponse {
        raw_response(status, body.as_bytes())
    }

    #[test]
    fn body_equals_exact_match() {
        let check = Check::body_equals("Query successfully", "hello world!");
        assert!(check.evaluate(&response(200, "hello world!")));
    }

    #[test]
    fn body_equals_is_case_sensitive() {
        let check = Check::body_equals("Query successfully", "hello world!");
        assert!(!check.evaluate(&response(200, "Hello world!")));
    }

    #[test]
    fn body_equals_rejects_surrounding_whitespace() {
        let check = Check::body_equals("Query successfully", "hello world!");
        assert!(!check.evaluate(&response(200, "hello world!\n")));
        assert!(!check.evaluate(&response(200, " hello world!")));
    }

    #[test]
    fn empty_body_fails_unless_expected_is_empty() {
        let check = Check::body_equals("Query successfully", "hello world!");
        assert!(!check.evaluate(&response(200, "")));

        let empty = Check::body_equals("empty", "");
        assert!(empty.evaluate(&response(200, "")));
        assert!(!empty.evaluate(&response(200, "x")));
    }

    #[test]
    fn body_equals_multi_byte() {
        let check = Check::body_equals("Query ads successfully", "测试");
        assert!(check.evaluate(&response(200, "测试")));
        assert!(!check.evaluate(&response(200, "测")));
        assert!(!check.evaluate(&response(200, "测试 ")));
        // Same glyphs are not enough, the bytes must match.
        assert!(!check.evaluate(&response(200, "\u{6d4b}\u{8bd5}\u{200b}")));
    }

    #[test]
    fn body_equals_compares_raw_bytes() {
        // Lossy decoding would turn this body into the replacement character.
        let check = Check::body_equals("replacement", "\u{FFFD}");
        assert!(!check.evaluate(&raw_response(200, b"\xff")));
        assert!(check.evaluate(&raw_response(200, "\u{FFFD}".as_bytes())));
    }

    #[test]
    fn evaluation_is_repeatable() {
        let check = Check::body_equals("Query successfully", "hello world!");
        let ok = response(200, "hello world!");
        let bad = response(200, "nope");

        let outcomes = [&ok, &bad, &ok, &bad]
            .iter()
            .map(|r| check.evaluate(r))
            .collect::<Vec<_>>();
        assert_eq!(vec![true, false, true, false], outcomes);
    }

    #[test]
    fn status_is() {
        let check = Check::status_is("status is 200", 200);
        assert!(check.evaluate(&response(200, "")));
        assert!(!check.evaluate(&response(204, "")));
    }
}
