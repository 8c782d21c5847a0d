//! Livestatus query construction.
//!
//! This module defines the [`Query`] struct, a chainable builder that
//! accumulates Livestatus query-language fragments (columns, filters,
//! combinators, statistics, output controls) and renders them into the exact
//! request text the daemon expects.
//!
//! A `Query` is a finished, read-only description of one request. It
//! performs no I/O; hand it to a
//! [`LivestatusClient`](crate::protocol::LivestatusClient) to run it. Because
//! each query is its own value, nothing leaks from one request into the next
//! and the same query can be executed any number of times.
//!
//! # Example
//! ```rust
//! use livestat::Query;
//!
//! let request = Query::get("services")
//!     .column("host_name")
//!     .column("description")
//!     .filter("state = 2")
//!     .filter("in_notification_period = 1")
//!     .and(2)
//!     .render()
//!     .unwrap();
//!
//! assert!(request.starts_with("GET services\n"));
//! assert!(request.ends_with("\n\n"));
//! ```
use thiserror::Error;

/// List of possible errors raised while rendering a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("a table name must be supplied")]
    MissingTable,

    #[error("'{0}' requires a non-empty argument")]
    EmptyArgument(&'static str),
}

/// One accumulated query-language line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment {
    Filter(String),
    Stats(String),
    And(usize),
    Or(usize),
    Negate,
    StatsAnd(usize),
    StatsNegate,
    Parameter(String),
}

/// A single Livestatus GET request, assembled fragment by fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    column_headers: Option<bool>,
    fragments: Vec<Fragment>,
    output_format: Option<String>,
    auth_user: Option<String>,
    limit: Option<usize>,
    raw: Option<String>,
}

impl Query {
    /// Start a query against the given table.
    pub fn get(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Use a pre-formatted request verbatim instead of assembled fragments.
    ///
    /// Escape hatch for requests the builder cannot express. The framing
    /// trailer (`ResponseHeader: fixed16` and the blank line) is still
    /// appended on render.
    pub fn raw(request: impl Into<String>) -> Self {
        Self {
            raw: Some(request.into()),
            ..Self::default()
        }
    }

    /// Append one column to the projection.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Replace the projection with the given columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Ask the daemon to emit (or suppress) a header row of column names.
    ///
    /// Only rendered when an explicit projection is set.
    pub fn column_headers(mut self, on: bool) -> Self {
        self.column_headers = Some(on);
        self
    }

    /// Append a `Filter:` line. Multiple filters accumulate; the daemon
    /// ANDs them unless combined with [`and`](Self::and)/[`or`](Self::or).
    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.fragments.push(Fragment::Filter(expr.into()));
        self
    }

    /// Append a `Stats:` line.
    pub fn stats(mut self, expr: impl Into<String>) -> Self {
        self.fragments.push(Fragment::Stats(expr.into()));
        self
    }

    /// Alias for [`stats`](Self::stats).
    pub fn stat(self, expr: impl Into<String>) -> Self {
        self.stats(expr)
    }

    /// Combine the preceding `count` lines with a logical AND.
    pub fn and(mut self, count: usize) -> Self {
        self.fragments.push(Fragment::And(count));
        self
    }

    /// Combine the preceding `count` lines with a logical OR.
    pub fn or(mut self, count: usize) -> Self {
        self.fragments.push(Fragment::Or(count));
        self
    }

    /// Negate the immediately preceding filter line.
    pub fn negate(mut self) -> Self {
        self.fragments.push(Fragment::Negate);
        self
    }

    /// Combine the preceding `count` stats lines with a logical AND.
    pub fn stats_and(mut self, count: usize) -> Self {
        self.fragments.push(Fragment::StatsAnd(count));
        self
    }

    /// Negate the immediately preceding stats line.
    pub fn stats_negate(mut self) -> Self {
        self.fragments.push(Fragment::StatsNegate);
        self
    }

    /// Append an arbitrary pre-formatted query-language line verbatim.
    ///
    /// Blank input is a no-op.
    pub fn parameter(mut self, line: impl Into<String>) -> Self {
        let line = line.into();
        if !line.trim().is_empty() {
            self.fragments.push(Fragment::Parameter(line));
        }
        self
    }

    /// Override the default structured output format.
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Cap the number of result rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restrict results to those visible to the given contact.
    pub fn auth_user(mut self, user: impl Into<String>) -> Self {
        self.auth_user = Some(user.into());
        self
    }

    /// Render the complete request text, terminated by the fixed16 response
    /// header directive and the blank line that signals end of request.
    pub fn render(&self) -> Result<String, QueryError> {
        let mut request = match &self.raw {
            Some(raw) => terminated(raw),
            None => self.assemble()?,
        };

        request.push_str("ResponseHeader: fixed16\n");
        request.push('\n');
        Ok(request)
    }

    fn assemble(&self) -> Result<String, QueryError> {
        if self.table.is_empty() {
            return Err(QueryError::MissingTable);
        }

        let mut request = format!("GET {}\n", self.table);

        if !self.columns.is_empty() {
            if self.columns.iter().any(|c| c.trim().is_empty()) {
                return Err(QueryError::EmptyArgument("Columns"));
            }
            request.push_str(&format!("Columns: {}\n", self.columns.join(" ")));

            if let Some(on) = self.column_headers {
                let state = if on { "on" } else { "off" };
                request.push_str(&format!("ColumnHeaders: {state}\n"));
            }
        }

        for fragment in &self.fragments {
            match fragment {
                Fragment::Filter(expr) => {
                    let expr = non_empty(expr, "Filter")?;
                    request.push_str(&format!("Filter: {expr}\n"));
                }
                Fragment::Stats(expr) => {
                    let expr = non_empty(expr, "Stats")?;
                    request.push_str(&format!("Stats: {expr}\n"));
                }
                Fragment::And(count) => request.push_str(&format!("And: {count}\n")),
                Fragment::Or(count) => request.push_str(&format!("Or: {count}\n")),
                Fragment::Negate => request.push_str("Negate:\n"),
                Fragment::StatsAnd(count) => request.push_str(&format!("StatsAnd: {count}\n")),
                Fragment::StatsNegate => request.push_str("StatsNegate:\n"),
                Fragment::Parameter(line) => request.push_str(&terminated(line)),
            }
        }

        if let Some(fmt) = &self.output_format {
            let fmt = non_empty(fmt, "OutputFormat")?;
            request.push_str(&format!("OutputFormat: {fmt}\n"));
        }

        if let Some(user) = &self.auth_user {
            let user = non_empty(user, "AuthUser")?;
            request.push_str(&format!("AuthUser: {user}\n"));
        }

        if let Some(limit) = self.limit {
            request.push_str(&format!("Limit: {limit}\n"));
        }

        Ok(request)
    }

    /// Columns explicitly requested by the caller, if any.
    pub(crate) fn explicit_columns(&self) -> &[String] {
        &self.columns
    }

    /// Output format override, if any.
    pub(crate) fn format(&self) -> Option<&str> {
        self.output_format.as_deref()
    }
}

fn non_empty<'a>(value: &'a str, directive: &'static str) -> Result<&'a str, QueryError> {
    if value.trim().is_empty() {
        Err(QueryError::EmptyArgument(directive))
    } else {
        Ok(value)
    }
}

fn terminated(line: &str) -> String {
    let mut line = line.to_string();
    if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_table_query() {
        let request = Query::get("hosts").render().unwrap();

        assert_eq!(request, "GET hosts\nResponseHeader: fixed16\n\n");
    }

    #[test]
    fn columns_and_headers_follow_the_get_line() {
        let request = Query::get("hosts")
            .column("host_name")
            .column("host_alias")
            .column_headers(true)
            .filter("state = 2")
            .render()
            .unwrap();

        assert_eq!(
            request,
            "GET hosts\n\
             Columns: host_name host_alias\n\
             ColumnHeaders: on\n\
             Filter: state = 2\n\
             ResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn column_headers_without_columns_are_not_rendered() {
        let request = Query::get("hosts").column_headers(true).render().unwrap();

        assert_eq!(request, "GET hosts\nResponseHeader: fixed16\n\n");
    }

    #[test]
    fn filters_accumulate_in_order() {
        let request = Query::get("services")
            .filter("state = 2")
            .or(1)
            .render()
            .unwrap();

        assert_eq!(
            request,
            "GET services\nFilter: state = 2\nOr: 1\nResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn stats_and_combinators() {
        let request = Query::get("services")
            .stats("state = 0")
            .stat("state = 1")
            .stats_and(2)
            .stats_negate()
            .negate()
            .render()
            .unwrap();

        assert_eq!(
            request,
            "GET services\n\
             Stats: state = 0\n\
             Stats: state = 1\n\
             StatsAnd: 2\n\
             StatsNegate:\n\
             Negate:\n\
             ResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn output_controls_render_after_fragments() {
        let request = Query::get("hosts")
            .filter("state = 1")
            .output_format("json")
            .auth_user("monitor")
            .limit(10)
            .render()
            .unwrap();

        assert_eq!(
            request,
            "GET hosts\n\
             Filter: state = 1\n\
             OutputFormat: json\n\
             AuthUser: monitor\n\
             Limit: 10\n\
             ResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn replacing_columns_discards_earlier_ones() {
        let request = Query::get("hosts")
            .column("address")
            .columns(["host_name", "host_alias"])
            .render()
            .unwrap();

        assert_eq!(
            request,
            "GET hosts\nColumns: host_name host_alias\nResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn blank_parameter_is_a_no_op() {
        let query = Query::get("hosts").parameter("   ");

        assert_eq!(query, Query::get("hosts"));
    }

    #[test]
    fn parameter_lines_are_newline_terminated() {
        let request = Query::get("hosts")
            .parameter("WaitTrigger: check")
            .render()
            .unwrap();

        assert_eq!(
            request,
            "GET hosts\nWaitTrigger: check\nResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn raw_request_bypasses_assembly() {
        let request = Query::raw("GET hosts\nColumns: host_name").render().unwrap();

        assert_eq!(
            request,
            "GET hosts\nColumns: host_name\nResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn missing_table_is_rejected() {
        let res = Query::default().filter("state = 2").render();

        assert_eq!(res, Err(QueryError::MissingTable));
    }

    #[test]
    fn empty_filter_expression_is_rejected() {
        let res = Query::get("hosts").filter("  ").render();

        assert_eq!(res, Err(QueryError::EmptyArgument("Filter")));
    }

    #[test]
    fn empty_column_name_is_rejected() {
        let res = Query::get("hosts").column("").render();

        assert_eq!(res, Err(QueryError::EmptyArgument("Columns")));
    }
}
