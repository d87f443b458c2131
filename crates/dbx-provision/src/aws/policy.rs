//! IAM and bucket policy documents
//!
//! Policies are modelled only as far as the patcher needs: `Action` and
//! `Resource` are typed, every other field of a statement or document is kept
//! in an `extra` map so it survives a read/modify/write cycle untouched.

use dbx_provision_common::defaults::{DATABRICKS_PRINCIPAL_ARN, POLICY_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Sid of the statement in the bucket policy
pub const BUCKET_POLICY_SID: &str = "Grant Databricks Access";

/// Actions granted to the Databricks principal on the bucket
pub const BUCKET_ACTIONS: &[&str] = &[
    "s3:GetObject",
    "s3:GetObjectVersion",
    "s3:PutObject",
    "s3:DeleteObject",
    "s3:ListBucket",
    "s3:GetBucketLocation",
];

/// ARN of a bucket
pub fn bucket_arn(bucket_name: &str) -> String {
    format!("arn:aws:s3:::{bucket_name}")
}

/// Bucket policy granting the Databricks control plane access to the bucket,
/// restricted to principals tagged with the given Databricks account id.
pub fn bucket_policy(bucket_name: &str, databricks_account_id: &str) -> Value {
    let arn = bucket_arn(bucket_name);
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Sid": BUCKET_POLICY_SID,
                "Effect": "Allow",
                "Principal": {
                    "AWS": DATABRICKS_PRINCIPAL_ARN
                },
                "Action": BUCKET_ACTIONS,
                "Resource": [
                    format!("{arn}/*"),
                    arn
                ],
                "Condition": {
                    "StringEquals": {
                        "aws:PrincipalTag/DatabricksAccountId": [
                            databricks_account_id
                        ]
                    }
                }
            }
        ]
    })
}

/// A JSON field that IAM accepts either as a scalar or as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v,
        }
    }

    /// Append a value, turning a scalar into a list
    pub fn push(&mut self, value: T) {
        let list = match std::mem::replace(self, OneOrMany::Many(Vec::new())) {
            OneOrMany::One(first) => vec![first, value],
            OneOrMany::Many(mut v) => {
                v.push(value);
                v
            }
        };
        *self = OneOrMany::Many(list);
    }
}

/// One policy statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Action", default, skip_serializing_if = "Option::is_none")]
    pub action: Option<OneOrMany<String>>,

    #[serde(rename = "Resource", default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<OneOrMany<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Statement {
    /// True if any action is in the `s3:` namespace
    pub fn has_s3_action(&self) -> bool {
        self.action
            .as_ref()
            .is_some_and(|a| a.as_slice().iter().any(|a| a.starts_with("s3:")))
    }
}

/// An IAM policy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Statement")]
    pub statement: OneOrMany<Statement>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PolicyDocument {
    pub fn statements_mut(&mut self) -> &mut [Statement] {
        match &mut self.statement {
            OneOrMany::One(s) => std::slice::from_mut(s),
            OneOrMany::Many(v) => v,
        }
    }
}

/// What [`patch_s3_resources`] changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchOutcome {
    /// Statements with an `s3:` action and a `Resource` field
    pub matched: usize,
    /// Resource entries appended across all matched statements
    pub added: usize,
}

impl PatchOutcome {
    /// The document changed and must be written back
    pub fn needs_write(&self) -> bool {
        self.added > 0
    }
}

/// Add `bucket_arn` and `bucket_arn/*` to every statement that has an `s3:`
/// action and a `Resource` field. Existing entries are not duplicated.
pub fn patch_s3_resources(doc: &mut PolicyDocument, bucket_arn: &str) -> PatchOutcome {
    let targets = [bucket_arn.to_string(), format!("{bucket_arn}/*")];
    let mut outcome = PatchOutcome::default();

    for statement in doc.statements_mut() {
        if !statement.has_s3_action() {
            continue;
        }
        let Some(resources) = statement.resource.as_mut() else {
            continue;
        };

        outcome.matched += 1;
        for target in &targets {
            if !resources.as_slice().contains(target) {
                resources.push(target.clone());
                outcome.added += 1;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:s3:::lake";

    fn doc(v: Value) -> PolicyDocument {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_bucket_policy_shape() {
        let policy = bucket_policy("lake", "acct-1");
        let stmt = &policy["Statement"][0];
        assert_eq!(policy["Version"], "2012-10-17");
        assert_eq!(stmt["Sid"], "Grant Databricks Access");
        assert_eq!(stmt["Principal"]["AWS"], "arn:aws:iam::414351767826:root");
        assert_eq!(stmt["Action"].as_array().unwrap().len(), 6);
        assert_eq!(
            stmt["Resource"],
            json!(["arn:aws:s3:::lake/*", "arn:aws:s3:::lake"])
        );
        assert_eq!(
            stmt["Condition"]["StringEquals"]["aws:PrincipalTag/DatabricksAccountId"],
            json!(["acct-1"])
        );
    }

    #[test]
    fn test_patch_adds_both_arns() {
        let mut d = doc(json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Action": ["s3:GetObject", "s3:PutObject"],
                "Resource": ["arn:aws:s3:::other/*"]
            }]
        }));
        let outcome = patch_s3_resources(&mut d, ARN);
        assert_eq!(outcome, PatchOutcome { matched: 1, added: 2 });
        assert_eq!(
            d.statements_mut()[0].resource.as_ref().unwrap().as_slice(),
            ["arn:aws:s3:::other/*", ARN, "arn:aws:s3:::lake/*"]
        );
    }

    #[test]
    fn test_scalar_action_and_resource() {
        let mut d = doc(json!({
            "Statement": {
                "Effect": "Allow",
                "Action": "s3:ListBucket",
                "Resource": "arn:aws:s3:::other"
            }
        }));
        let outcome = patch_s3_resources(&mut d, ARN);
        assert_eq!(outcome.matched, 1);
        let out = serde_json::to_value(&d).unwrap();
        assert_eq!(
            out["Statement"]["Resource"],
            json!(["arn:aws:s3:::other", ARN, "arn:aws:s3:::lake/*"])
        );
    }

    #[test]
    fn test_non_s3_and_resourceless_statements_untouched() {
        let mut d = doc(json!({
            "Statement": [
                {"Effect": "Allow", "Action": ["ec2:RunInstances"], "Resource": "*"},
                {"Effect": "Allow", "Action": ["s3:GetObject"], "NotResource": "x"}
            ]
        }));
        let before = d.clone();
        let outcome = patch_s3_resources(&mut d, ARN);
        assert_eq!(outcome, PatchOutcome::default());
        assert!(!outcome.needs_write());
        assert_eq!(d, before);
    }

    #[test]
    fn test_already_present_needs_no_write() {
        let mut d = doc(json!({
            "Statement": [{
                "Action": ["s3:*"],
                "Resource": [ARN, "arn:aws:s3:::lake/*"]
            }]
        }));
        let outcome = patch_s3_resources(&mut d, ARN);
        assert_eq!(outcome, PatchOutcome { matched: 1, added: 0 });
        assert!(!outcome.needs_write());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let input = json!({
            "Version": "2012-10-17",
            "Id": "custom",
            "Statement": [{
                "Sid": "Data",
                "Effect": "Allow",
                "Action": ["s3:GetObject"],
                "Resource": ["arn:aws:s3:::other"],
                "Condition": {"Bool": {"aws:SecureTransport": "true"}}
            }]
        });
        let mut d = doc(input.clone());
        patch_s3_resources(&mut d, ARN);
        let out = serde_json::to_value(&d).unwrap();
        assert_eq!(out["Id"], "custom");
        assert_eq!(out["Version"], "2012-10-17");
        assert_eq!(out["Statement"][0]["Sid"], "Data");
        assert_eq!(out["Statement"][0]["Condition"], input["Statement"][0]["Condition"]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn statement() -> impl Strategy<Value = Value> {
            (
                prop::collection::vec(
                    prop_oneof![
                        Just("s3:GetObject"),
                        Just("s3:ListBucket"),
                        Just("ec2:DescribeVpcs"),
                        Just("iam:PassRole"),
                    ],
                    1..4,
                ),
                prop::option::of(prop::collection::vec(
                    prop_oneof![
                        Just("*".to_string()),
                        Just(ARN.to_string()),
                        Just(format!("{ARN}/*")),
                        "arn:aws:s3:::[a-z]{3,8}",
                    ],
                    0..4,
                )),
            )
                .prop_map(|(actions, resources)| {
                    let mut stmt = json!({"Effect": "Allow", "Action": actions});
                    if let Some(r) = resources {
                        stmt["Resource"] = json!(r);
                    }
                    stmt
                })
        }

        proptest! {
            #[test]
            fn patch_is_idempotent(stmts in prop::collection::vec(statement(), 1..6)) {
                let mut once = doc(json!({"Version": "2012-10-17", "Statement": stmts}));
                patch_s3_resources(&mut once, ARN);
                let mut twice = once.clone();
                let second = patch_s3_resources(&mut twice, ARN);
                prop_assert_eq!(second.added, 0);
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn matched_statements_contain_both_arns(stmts in prop::collection::vec(statement(), 1..6)) {
                let mut d = doc(json!({"Statement": stmts}));
                patch_s3_resources(&mut d, ARN);
                let wildcard = format!("{ARN}/*");
                for s in d.statements_mut() {
                    let Some(resources) = &s.resource else { continue };
                    let has_arn = resources.as_slice().iter().filter(|r| *r == ARN).count();
                    let has_wild = resources.as_slice().iter().filter(|r| **r == wildcard).count();
                    if s.has_s3_action() {
                        prop_assert!(has_arn >= 1 && has_wild >= 1);
                    }
                }
            }
        }
    }
}
