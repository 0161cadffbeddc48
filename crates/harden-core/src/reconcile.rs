//! ConfigReconciler: drive a document toward a directive set
//!
//! For each directive, in caller order, the first line keyed by the
//! directive's key (enabled or commented out) is replaced with the rendered
//! directive; if no line is keyed by it, the rendered line is appended.
//! Matching parses each line into key and remainder and compares keys
//! exactly, so directive values never act as pattern syntax.

use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::directive::Directive;
use crate::document::ConfigDocument;

/// What happened to the line a directive addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// An existing line was rewritten
    Replaced,
    /// No line carried the key; a new one was added at the end
    Appended,
    /// The existing line already matched
    Unchanged,
}

/// Per-directive outcome of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveChange {
    pub key: String,
    /// Zero-based line index in the resulting document
    pub line: usize,
    pub kind: ChangeKind,
    /// Text previously at `line` without its terminator, absent for appends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    /// Text now at `line`, without its terminator
    pub current: String,
}

impl DirectiveChange {
    pub fn is_change(&self) -> bool {
        self.kind != ChangeKind::Unchanged
    }
}

/// A reconciled document together with what changed.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub document: ConfigDocument,
    pub changes: Vec<DirectiveChange>,
}

impl Reconciliation {
    /// Number of directives that altered the document.
    pub fn changed(&self) -> usize {
        self.changes.iter().filter(|c| c.is_change()).count()
    }

    /// Number of directives that found their line already in place.
    pub fn unchanged(&self) -> usize {
        self.changes.len() - self.changed()
    }

    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(DirectiveChange::is_change)
    }
}

/// Applies directives to documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigReconciler;

impl ConfigReconciler {
    pub fn new() -> Self {
        Self
    }

    /// Apply `directives` to a copy of `document`.
    ///
    /// Never fails: lines that do not parse as `key value` are passed
    /// through. Callers are expected to have rejected duplicate keys.
    pub fn reconcile(
        &self,
        document: &ConfigDocument,
        directives: &[Directive],
    ) -> Reconciliation {
        let mut document = document.clone();
        let mut changes = Vec::with_capacity(directives.len());
        let append_ending = if document.uses_crlf() { "\r" } else { "" };

        for directive in directives {
            let rendered = directive.render();
            let change = match document.find_key(&directive.key) {
                Some(index) => {
                    // A replaced line keeps its own terminator
                    let ending = match document.line(index) {
                        Some(line) if line.ends_with('\r') => "\r",
                        _ => "",
                    };
                    let written = format!("{rendered}{ending}");
                    let previous = document.replace(index, written.clone()).unwrap_or_default();
                    let kind = if previous == written {
                        ChangeKind::Unchanged
                    } else {
                        ChangeKind::Replaced
                    };
                    tracing::debug!(key = %directive.key, line = index, ?kind, "directive matched");
                    DirectiveChange {
                        key: directive.key.clone(),
                        line: index,
                        kind,
                        previous: Some(previous.trim_end_matches('\r').to_string()),
                        current: rendered,
                    }
                }
                None => {
                    let index = document.push(format!("{rendered}{append_ending}"));
                    tracing::debug!(key = %directive.key, line = index, "directive appended");
                    DirectiveChange {
                        key: directive.key.clone(),
                        line: index,
                        kind: ChangeKind::Appended,
                        previous: None,
                        current: rendered,
                    }
                }
            };
            changes.push(change);
        }

        Reconciliation { document, changes }
    }

    /// Reconcile source text and describe the result as a unified diff.
    ///
    /// Nothing is written; used for dry runs.
    pub fn plan(&self, source: &str, directives: &[Directive], label: &str) -> Plan {
        let reconciliation = self.reconcile(&ConfigDocument::parse(source), directives);
        let rendered = reconciliation.document.render();
        let diff = TextDiff::from_lines(source, rendered.as_str())
            .unified_diff()
            .context_radius(2)
            .header(label, &format!("{label} (reconciled)"))
            .to_string();

        Plan {
            changes: reconciliation.changes,
            diff,
        }
    }
}

/// Dry-run result: what would change and how the file would differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub changes: Vec<DirectiveChange>,
    /// Unified diff, empty when nothing would change
    pub diff: String,
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        !self.changes.iter().any(DirectiveChange::is_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reconcile(source: &str, directives: &[Directive]) -> Reconciliation {
        ConfigReconciler::new().reconcile(&ConfigDocument::parse(source), directives)
    }

    #[test]
    fn replaces_disabled_line_in_place() {
        let source = "Port 22\n#MACs hmac-sha1\nX11Forwarding yes\n";
        let result = reconcile(
            source,
            &[Directive::set("MACs", "hmac-sha2-512-etm@openssh.com")],
        );

        assert_eq!(
            result.document.render(),
            "Port 22\nMACs hmac-sha2-512-etm@openssh.com\nX11Forwarding yes\n"
        );
        assert_eq!(result.changes[0].kind, ChangeKind::Replaced);
        assert_eq!(result.changes[0].line, 1);
        assert_eq!(result.changes[0].previous.as_deref(), Some("#MACs hmac-sha1"));
    }

    #[test]
    fn appends_missing_keys_in_order() {
        let source = "# empty config\n";
        let result = reconcile(
            source,
            &[
                Directive::set("Ciphers", "aes256-gcm@openssh.com"),
                Directive::set("PermitRootLogin", "no"),
            ],
        );

        assert_eq!(
            result.document.render(),
            "# empty config\nCiphers aes256-gcm@openssh.com\nPermitRootLogin no\n"
        );
        assert!(result.changes.iter().all(|c| c.kind == ChangeKind::Appended));
    }

    #[test]
    fn unchanged_line_reports_no_change() {
        let result = reconcile("PermitRootLogin no\n", &[Directive::set("PermitRootLogin", "no")]);
        assert_eq!(result.changes[0].kind, ChangeKind::Unchanged);
        assert!(!result.has_changes());
    }

    #[test]
    fn whitespace_difference_counts_as_change() {
        let result = reconcile(
            "PermitRootLogin   no\n",
            &[Directive::set("PermitRootLogin", "no")],
        );
        assert_eq!(result.changes[0].kind, ChangeKind::Replaced);
        assert_eq!(result.document.render(), "PermitRootLogin no\n");
    }

    #[test]
    fn only_first_duplicate_is_addressed() {
        let source = "Ciphers 3des-cbc\nPort 22\nCiphers aes128-cbc\n";
        let result = reconcile(source, &[Directive::set("Ciphers", "aes256-ctr")]);
        assert_eq!(
            result.document.render(),
            "Ciphers aes256-ctr\nPort 22\nCiphers aes128-cbc\n"
        );
    }

    #[test]
    fn disabling_an_enabled_line() {
        let result = reconcile(
            "UseDNS yes\n",
            &[Directive::disable("UseDNS", "yes", Some("disabled by harden".into()))],
        );
        assert_eq!(result.document.render(), "#UseDNS yes # disabled by harden\n");

        let again = reconcile(
            &result.document.render(),
            &[Directive::disable("UseDNS", "yes", Some("disabled by harden".into()))],
        );
        assert!(!again.has_changes());
    }

    #[test]
    fn regex_metacharacters_in_values_are_literal() {
        let value = r"aes.*|$(rm -rf /)\1&";
        let result = reconcile("Ciphers old\n", &[Directive::set("Ciphers", value)]);
        assert_eq!(result.document.render(), format!("Ciphers {value}\n"));
    }

    #[test]
    fn crlf_documents_keep_crlf_on_rewritten_lines() {
        let source = "Port 22\r\n#MACs hmac-sha1\r\n";
        let directives = [
            Directive::set("MACs", "hmac-sha2-512-etm@openssh.com"),
            Directive::set("PermitRootLogin", "no"),
        ];
        let result = reconcile(source, &directives);

        assert_eq!(
            result.document.render(),
            "Port 22\r\nMACs hmac-sha2-512-etm@openssh.com\r\nPermitRootLogin no\r\n"
        );
        assert_eq!(result.changes[0].previous.as_deref(), Some("#MACs hmac-sha1"));

        let again = reconcile(&result.document.render(), &directives);
        assert!(!again.has_changes());
    }

    #[test]
    fn plan_produces_diff_and_leaves_source_alone() {
        let source = "#MACs hmac-sha1\n";
        let plan = ConfigReconciler::new().plan(
            source,
            &[Directive::set("MACs", "hmac-sha2-256")],
            "sshd_config",
        );
        assert!(!plan.is_noop());
        assert!(plan.diff.contains("-#MACs hmac-sha1"), "diff: {}", plan.diff);
        assert!(plan.diff.contains("+MACs hmac-sha2-256"), "diff: {}", plan.diff);
    }

    #[test]
    fn plan_of_converged_document_is_empty() {
        let plan = ConfigReconciler::new().plan(
            "MACs hmac-sha2-256\n",
            &[Directive::set("MACs", "hmac-sha2-256")],
            "sshd_config",
        );
        assert!(plan.is_noop());
        assert!(plan.diff.is_empty());
    }
}
