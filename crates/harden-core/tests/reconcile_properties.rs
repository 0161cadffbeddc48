//! Reconciliation properties over generated documents

use harden_core::{ConfigDocument, ConfigReconciler, Directive};
use harden_test_utils::fixtures;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const KEYS: &[&str] = &[
    "Ciphers",
    "MACs",
    "KexAlgorithms",
    "PermitRootLogin",
    "X11Forwarding",
    "MaxAuthTries",
];

fn line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "# [a-z ]{0,20}",
        (prop::sample::select(KEYS), "[a-z0-9,@.-]{1,16}").prop_map(|(k, v)| format!("{k} {v}")),
        (prop::sample::select(KEYS), "[a-z0-9,@.-]{1,16}").prop_map(|(k, v)| format!("#{k} {v}")),
        (prop::sample::select(KEYS), "[a-z0-9]{1,8}").prop_map(|(k, v)| format!("  {k}\t{v}")),
        "Match [a-z]{1,8}",
    ]
}

fn document() -> impl Strategy<Value = String> {
    (prop::collection::vec(line(), 0..12), any::<bool>()).prop_map(|(lines, trailing)| {
        let mut text = lines.join("\n");
        if trailing && !text.is_empty() {
            text.push('\n');
        }
        text
    })
}

fn directives() -> impl Strategy<Value = Vec<Directive>> {
    prop::sample::subsequence(KEYS.to_vec(), 0..=KEYS.len()).prop_flat_map(|keys| {
        let n = keys.len();
        (
            Just(keys),
            prop::collection::vec("[a-z0-9@.-]{1,12}", n),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(|(keys, values, disabled)| {
                keys.into_iter()
                    .zip(values)
                    .zip(disabled)
                    .map(|((key, value), off)| {
                        if off {
                            Directive::disable(key, value, None)
                        } else {
                            Directive::set(key, value)
                        }
                    })
                    .collect()
            })
    })
}

fn apply(text: &str, directives: &[Directive]) -> (String, usize) {
    let result = ConfigReconciler::new().reconcile(&ConfigDocument::parse(text), directives);
    (result.document.render(), result.changed())
}

proptest! {
    #[test]
    fn parse_render_is_lossless(text in document()) {
        prop_assert_eq!(ConfigDocument::parse(&text).render(), text);
    }

    #[test]
    fn second_pass_changes_nothing(text in document(), directives in directives()) {
        let (once, _) = apply(&text, &directives);
        let (twice, changed) = apply(&once, &directives);
        prop_assert_eq!(changed, 0);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn unrelated_lines_survive(text in document(), directives in directives()) {
        let (output, _) = apply(&text, &directives);
        let touched: Vec<&str> = directives.iter().map(|d| d.key.as_str()).collect();
        for line in text.lines() {
            let mentions_key = touched.iter().any(|k| line.contains(k));
            if !mentions_key {
                prop_assert!(output.lines().any(|l| l == line), "lost line {:?}", line);
            }
        }
    }
}

#[test]
fn no_op_reconcile_of_fixtures_is_byte_exact() {
    for text in [
        fixtures::SSHD_CONFIG_RHEL,
        fixtures::SSH_CONFIG_DEBIAN,
        fixtures::COMMENTS_ONLY,
    ] {
        let (output, changed) = apply(text, &[]);
        assert_eq!(changed, 0);
        assert_eq!(output, text);
    }
}

#[test]
fn comments_only_file_gets_directives_appended() {
    let directives = vec![
        Directive::set("PermitRootLogin", "no"),
        Directive::set("X11Forwarding", "no"),
    ];
    let (output, changed) = apply(fixtures::COMMENTS_ONLY, &directives);
    assert_eq!(changed, 2);
    assert_eq!(
        output,
        format!(
            "{}PermitRootLogin no\nX11Forwarding no\n",
            fixtures::COMMENTS_ONLY
        )
    );
}
