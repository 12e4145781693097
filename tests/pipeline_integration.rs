use datapress::aggregate::AggregateKey;
use datapress::datasets::{AbuseReport, Download};
use datapress::dictionary::read_dictionary;
use datapress::error::{DatapressError, Result};
use datapress::integrity::verify_receipt;
use datapress::pipeline;
use datapress::secret::{ContentKey, TokenCipher};
use secrecy::SecretString;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from("testdata").join(name)
}

fn cipher(secret: &str) -> TokenCipher {
    TokenCipher::new(&ContentKey::from_secret(&SecretString::new(secret.into())).unwrap())
}

fn abuse_inputs() -> Vec<PathBuf> {
    vec![
        fixture("abuse_reports_a.csv"),
        fixture("abuse_reports_b.csv"),
    ]
}

#[test]
fn test_abuse_batch_end_to_end() -> Result<()> {
    let out = tempdir()?;
    let cipher = cipher("41424344");

    let packed =
        pipeline::pack::<AbuseReport>(&abuse_inputs(), out.path(), Some(&cipher), true)?;
    assert_eq!(packed.dataset, "abuse");
    assert_eq!(packed.records, 6);
    assert_eq!(packed.dropped, 3);
    assert_eq!(packed.redacted, 2);
    assert_eq!(packed.artifact, out.path().join("abuse.json.zst"));

    // Addresses from both files share one dictionary, in byte order
    let addresses = read_dictionary(out.path(), "abuse", "address").unwrap();
    assert_eq!(addresses.id("C@X.com"), Some(1));
    assert_eq!(addresses.id("a@x.com"), Some(2));
    assert_eq!(addresses.id("b@x.com"), Some(3));
    assert_eq!(addresses.id("c@x.com"), Some(4));
    assert_eq!(addresses.len(), 4);

    let report = pipeline::report::<AbuseReport>(&packed.artifact, None, Some(&cipher), 10)?;
    assert_eq!(report.summary.total, 6);
    assert_eq!(report.summary.distinct_actors, 4);
    assert_eq!(report.summary.measure_sum, 13);
    assert_eq!(report.summary.zero_measure, 1);
    assert_eq!(report.redacted_comments, 0);

    let keys: Vec<String> = report
        .top_addresses
        .iter()
        .map(|e| e.key.to_string())
        .collect();
    assert_eq!(keys, ["a@x.com", "b@x.com", "c@x.com"]);
    assert_eq!(report.top_addresses[2].occurrences, 2);
    assert_eq!(report.top_addresses[2].reporters, 2);

    assert_eq!(report.top_reporters[0].key, AggregateKey::from("alice"));
    assert_eq!(report.top_reporters[1].key, AggregateKey::from("bob"));
    Ok(())
}

#[test]
fn test_redacted_comments_need_the_key() -> Result<()> {
    let out = tempdir()?;
    let right = cipher("41424344");
    let packed = pipeline::pack::<AbuseReport>(&abuse_inputs(), out.path(), Some(&right), false)?;

    // Plaintext PII never reaches the artifact
    let raw = fs::read(&packed.artifact)?;
    let text = datapress::codec::decompress_text(&raw)?;
    assert!(!text.contains("user@example.com"));
    assert!(!text.contains("555-7890"));
    assert!(text.contains("bulk mail from rotating IPs"));

    let sealed = pipeline::load::<AbuseReport>(&packed.artifact, None, None)?;
    assert_eq!(sealed.records.iter().filter(|r| r.redacted).count(), 2);

    let opened = pipeline::load::<AbuseReport>(&packed.artifact, None, Some(&right))?;
    assert!(opened.records.iter().all(|r| !r.redacted));
    assert!(
        opened
            .records
            .iter()
            .any(|r| r.comment == "reply to user@example.com for details")
    );

    let err = pipeline::load::<AbuseReport>(&packed.artifact, None, Some(&cipher("other")))
        .unwrap_err();
    assert!(matches!(err, DatapressError::AuthenticationFailed));
    Ok(())
}

#[test]
fn test_pii_without_secret_fails() {
    let out = tempdir().unwrap();
    let err = pipeline::pack::<AbuseReport>(&abuse_inputs(), out.path(), None, true).unwrap_err();
    assert!(matches!(err, DatapressError::MissingSecret));
}

#[test]
fn test_downloads_end_to_end() -> Result<()> {
    let out = tempdir()?;
    let packed =
        pipeline::pack::<Download>(&[fixture("downloads.csv")], out.path(), None, true)?;
    assert_eq!(packed.records, 5);
    assert_eq!(packed.dropped, 1);

    let report = pipeline::report::<Download>(&packed.artifact, None, None, 3)?;
    assert_eq!(report.summary.total, 5);
    assert_eq!(report.summary.distinct_actors, 4);
    assert_eq!(report.summary.measure_sum, 2_623_488);

    assert_eq!(report.countries.total, 5);
    assert_eq!(report.countries.shares.len(), 3);
    assert_eq!(report.countries.shares[0].key, AggregateKey::from("us"));
    assert_eq!(report.countries.shares[0].percentage, 40.0);
    assert_eq!(report.countries.shares[1].percentage, 20.0);

    assert_eq!(report.top_versions[0].key, AggregateKey::from("1.2.0"));
    assert_eq!(report.top_versions[0].occurrences, 4);
    assert_eq!(report.top_versions[0].reporters, 4);
    Ok(())
}

#[test]
fn test_receipt_detects_tampering() -> Result<()> {
    let out = tempdir()?;
    let packed =
        pipeline::pack::<Download>(&[fixture("downloads.csv")], out.path(), None, true)?;
    assert!(verify_receipt(&packed.receipt)?.passed);

    let mut bytes = fs::read(&packed.artifact)?;
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    fs::write(&packed.artifact, &bytes)?;

    let result = verify_receipt(&packed.receipt)?;
    assert!(!result.passed);
    assert!(result.message.contains("Hash mismatch"));
    Ok(())
}

#[test]
fn test_missing_columns_reported() {
    let out = tempdir().unwrap();
    let err = pipeline::pack::<AbuseReport>(
        &[fixture("missing_columns.csv")],
        out.path(),
        None,
        true,
    )
    .unwrap_err();
    match err {
        DatapressError::MissingColumns { dataset, columns } => {
            assert_eq!(dataset, "abuse");
            assert_eq!(columns, ["reported_at", "address", "blocks"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_two_datasets_share_one_output_dir() -> Result<()> {
    let out = tempdir()?;
    let cipher = cipher("41424344");

    let abuse = pipeline::pack::<AbuseReport>(&abuse_inputs(), out.path(), Some(&cipher), true)?;
    let downloads =
        pipeline::pack::<Download>(&[fixture("downloads.csv")], out.path(), None, true)?;

    let report = pipeline::report::<AbuseReport>(&abuse.artifact, None, Some(&cipher), 10)?;
    assert_eq!(report.top_addresses[0].key, AggregateKey::from("a@x.com"));

    let report = pipeline::report::<Download>(&downloads.artifact, None, None, 3)?;
    assert_eq!(report.countries.shares[0].key, AggregateKey::from("us"));
    Ok(())
}

#[test]
fn test_stale_artifact_rejected_after_repack() -> Result<()> {
    let out = tempdir()?;
    let first = pipeline::pack::<Download>(&[fixture("downloads.csv")], out.path(), None, true)?;
    let stale = out.path().join("downloads-previous.json.zst");
    fs::copy(&first.artifact, &stale)?;

    pipeline::pack::<Download>(&[fixture("downloads.csv")], out.path(), None, true)?;

    let err = pipeline::report::<Download>(&stale, None, None, 3).unwrap_err();
    assert!(matches!(err, DatapressError::DictionaryMismatch(_)));
    Ok(())
}
