//! End-to-end pipeline tests for bibstamp.
//!
//! The external compiler is the one collaborator these tests cannot assume
//! is installed, so most of them drive the pipeline with a small stub
//! script that behaves like `latexmk -pdf <job>`: it checks the staged
//! files, then "compiles" by copying the staged original to `<job>.pdf`.
//! The stub also writes its working directory to a witness file, which lets
//! the tests assert that the scoped staging directory is gone afterwards.
//!
//! One test runs the real latexmk; it is gated behind the `E2E_LATEX`
//! environment variable so CI without a TeX distribution skips it.
//!
//! Run with:
//!   cargo test --test e2e
//!   E2E_LATEX=1 cargo test --test e2e -- --nocapture   # includes the real run

use bibstamp::{annotate, resolve_publication, AnnotateConfig, BibstampError};
use lopdf::{dictionary, Document, Object, Stream};
use std::fs;
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

const BIB: &str = r#"
@string{icse = "Proc. ICSE"}

@inproceedings{smith2020,
    author    = {Alice Smith and Bob Jones},
    title     = {Measuring the Unmeasurable},
    booktitle = icse,
    publisher = {ACM},
    year      = {2020},
    doi       = {10.1145/1234_5.6},
}

@article{turing1950,
    author    = {Alan M. Turing},
    title     = {Computing Machinery and Intelligence},
    journal   = {Mind},
    publisher = {Oxford University Press},
    year      = {1950},
}

@inproceedings{icsm1998,
    title     = {Legacy Systems Revisited},
    booktitle = {Proc. ICSM},
    publisher = {IEEE Computer Society},
    year      = {1998},
}

@inproceedings{nopub2022,
    title     = {Unpublished Wisdom},
    booktitle = {Proc. of Nowhere},
    year      = {2022},
}

@phdthesis{thesis1999,
    title     = {A Thesis},
    school    = {Somewhere},
    publisher = {Nobody},
    year      = {1999},
}
"#;

fn write_bib(dir: &Path) -> PathBuf {
    let path = dir.join("refs.bib");
    fs::write(&path, BIB).unwrap();
    path
}

/// Build a minimal one-page PDF with a US-letter MediaBox.
fn write_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn config(bib: &Path, key: &str, compiler: &Path) -> AnnotateConfig {
    AnnotateConfig::builder()
        .bibliography(bib)
        .key(key)
        .compiler(compiler.to_string_lossy().to_string())
        .build()
        .unwrap()
}

// ── Stub-compiler tests (unix: the stub is a shell script) ──────────────────

#[cfg(unix)]
mod with_stub_compiler {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable stub that mimics `latexmk -pdf <job>` and records
    /// its working directory in `witness`.
    fn write_stub(dir: &Path, witness: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-latexmk");
        let script = format!(
            "#!/bin/sh\npwd > '{}'\njob=\"$2\"\n{}\n",
            witness.display(),
            body
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn ok_stub(dir: &Path, witness: &Path) -> PathBuf {
        write_stub(
            dir,
            witness,
            r#"[ -f "$job.tex" ] || exit 1
[ -f "$job-orig.pdf" ] || exit 1
grep -q "$job-orig" "$job.tex" || exit 2
cp "$job-orig.pdf" "$job.pdf""#,
        )
    }

    fn staging_dir(witness: &Path) -> PathBuf {
        PathBuf::from(fs::read_to_string(witness).unwrap().trim())
    }

    #[test]
    fn end_to_end_produces_output_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let bib = write_bib(dir.path());
        let input = dir.path().join("accepted.pdf");
        write_pdf(&input);
        let witness = dir.path().join("witness.txt");
        let stub = ok_stub(dir.path(), &witness);
        let output = dir.path().join("out").join("smith2020.pdf");

        let report = annotate(&input, &output, &config(&bib, "smith2020", &stub)).unwrap();

        assert!(output.is_file(), "destination PDF missing");
        assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
        assert_eq!(report.output, output);
        assert_eq!(report.geometry.width, 612.0);
        assert_eq!(report.geometry.height, 792.0);
        assert_eq!(report.publication.pubname, "Proc. ICSE");
        assert_eq!(report.publication.copyright_holder, "ACM");

        let staging = staging_dir(&witness);
        assert!(
            !staging.exists(),
            "staging directory {} not cleaned up",
            staging.display()
        );
    }

    #[test]
    fn ieee_computer_society_is_aliased() {
        let dir = tempfile::tempdir().unwrap();
        let bib = write_bib(dir.path());
        let input = dir.path().join("in.pdf");
        write_pdf(&input);
        let witness = dir.path().join("witness.txt");
        let stub = ok_stub(dir.path(), &witness);
        let output = dir.path().join("out.pdf");

        let report = annotate(&input, &output, &config(&bib, "icsm1998", &stub)).unwrap();
        assert_eq!(report.publication.copyright_holder, "IEEE");
    }

    #[test]
    fn copyright_override_reaches_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let bib = write_bib(dir.path());
        let input = dir.path().join("in.pdf");
        write_pdf(&input);
        let witness = dir.path().join("witness.txt");
        let stub = ok_stub(dir.path(), &witness);
        let output = dir.path().join("out.pdf");

        let config = AnnotateConfig::builder()
            .bibliography(&bib)
            .key("nopub2022")
            .copyright_holder("The Authors")
            .compiler(stub.to_string_lossy().to_string())
            .build()
            .unwrap();

        let report = annotate(&input, &output, &config).unwrap();
        assert_eq!(report.publication.copyright_holder, "The Authors");
    }

    #[test]
    fn failing_compiler_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let bib = write_bib(dir.path());
        let input = dir.path().join("in.pdf");
        write_pdf(&input);
        let witness = dir.path().join("witness.txt");
        let stub = write_stub(dir.path(), &witness, "echo 'Emergency stop.'\nexit 3");
        let output = dir.path().join("out").join("x.pdf");

        let err = annotate(&input, &output, &config(&bib, "smith2020", &stub)).unwrap_err();
        match err {
            BibstampError::Compilation { detail, .. } => {
                assert!(detail.contains("code 3"), "got: {detail}");
                assert!(detail.contains("Emergency stop."), "got: {detail}");
            }
            other => panic!("expected Compilation, got {other:?}"),
        }

        assert!(!output.exists(), "failed run must not touch the destination");
        assert!(!staging_dir(&witness).exists(), "staging dir not cleaned up");
    }

    #[test]
    fn compiler_success_without_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bib = write_bib(dir.path());
        let input = dir.path().join("in.pdf");
        write_pdf(&input);
        let witness = dir.path().join("witness.txt");
        let stub = write_stub(dir.path(), &witness, "exit 0");
        let output = dir.path().join("out.pdf");

        let err = annotate(&input, &output, &config(&bib, "smith2020", &stub)).unwrap_err();
        match err {
            BibstampError::Compilation { detail, .. } => {
                assert!(detail.contains("produced no"), "got: {detail}")
            }
            other => panic!("expected Compilation, got {other:?}"),
        }
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_destination_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let bib = write_bib(dir.path());
        let input = dir.path().join("in.pdf");
        write_pdf(&input);
        let witness = dir.path().join("witness.txt");
        let stub = ok_stub(dir.path(), &witness);

        // Occupying the parent path with a regular file blocks directory
        // creation regardless of process privileges.
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, b"in the way").unwrap();
        let output = blocked.join("out.pdf");

        let err = annotate(&input, &output, &config(&bib, "smith2020", &stub)).unwrap_err();
        assert!(matches!(err, BibstampError::OutputWriteFailed { .. }));
        assert!(!staging_dir(&witness).exists(), "staging dir not cleaned up");
    }

    #[test]
    fn custom_template_is_compiled_instead_of_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let bib = write_bib(dir.path());
        let input = dir.path().join("in.pdf");
        write_pdf(&input);
        let witness = dir.path().join("witness.txt");
        // This stub demands the custom marker in the rendered source.
        let stub = write_stub(
            dir.path(),
            &witness,
            r#"grep -q "custom-overlay 2020" "$job.tex" || exit 2
cp "$job-orig.pdf" "$job.pdf""#,
        );
        let output = dir.path().join("out.pdf");

        let config = AnnotateConfig::builder()
            .bibliography(&bib)
            .key("smith2020")
            .compiler(stub.to_string_lossy().to_string())
            .template("% custom-overlay %%YEAR%%\n\\documentclass{article}\n")
            .build()
            .unwrap();

        annotate(&input, &output, &config).unwrap();
        assert!(output.is_file());
    }
}

// ── Resolution failures (no compiler involved) ──────────────────────────────

#[test]
fn missing_key_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let bib = write_bib(dir.path());
    let input = dir.path().join("in.pdf");
    write_pdf(&input);
    let output = dir.path().join("out.pdf");

    let err = annotate(&input, &output, &config(&bib, "nosuchkey", Path::new("latexmk")))
        .unwrap_err();
    assert!(matches!(err, BibstampError::KeyNotFound { .. }));
    assert!(!output.exists());
}

#[test]
fn unsupported_type_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bib = write_bib(dir.path());
    let input = dir.path().join("in.pdf");
    write_pdf(&input);

    let err = annotate(
        &input,
        dir.path().join("out.pdf"),
        &config(&bib, "thesis1999", Path::new("latexmk")),
    )
    .unwrap_err();
    match err {
        BibstampError::UnsupportedType { kind, .. } => assert_eq!(kind, "phdthesis"),
        other => panic!("expected UnsupportedType, got {other:?}"),
    }
}

#[test]
fn missing_publisher_without_override_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bib = write_bib(dir.path());
    let input = dir.path().join("in.pdf");
    write_pdf(&input);

    let err = annotate(
        &input,
        dir.path().join("out.pdf"),
        &config(&bib, "nopub2022", Path::new("latexmk")),
    )
    .unwrap_err();
    assert!(matches!(err, BibstampError::MissingPublisher { .. }));
}

#[test]
fn malformed_bibliography_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let bib = dir.path().join("broken.bib");
    fs::write(&bib, "@article{broken, title = {unclosed}").unwrap();
    let input = dir.path().join("in.pdf");
    write_pdf(&input);

    let err = annotate(
        &input,
        dir.path().join("out.pdf"),
        &config(&bib, "broken", Path::new("latexmk")),
    )
    .unwrap_err();
    assert!(matches!(err, BibstampError::BibtexParse { .. }));
}

#[test]
fn missing_input_pdf_is_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let bib = write_bib(dir.path());

    let err = annotate(
        dir.path().join("absent.pdf"),
        dir.path().join("out.pdf"),
        &config(&bib, "smith2020", Path::new("latexmk")),
    )
    .unwrap_err();
    assert!(matches!(err, BibstampError::FileNotFound { .. }));
}

#[test]
fn resolve_publication_reads_macros_and_aliases() {
    let dir = tempfile::tempdir().unwrap();
    let bib = write_bib(dir.path());

    // @string macro substituted into booktitle
    let smith = resolve_publication(&bib, "smith2020", None).unwrap();
    assert_eq!(smith.pubname, "Proc. ICSE");
    assert_eq!(smith.year, "2020");
    assert_eq!(smith.doi.as_deref(), Some("10.1145/1234_5.6"));

    // journal-sourced pubname, publisher passes through unaliased
    let turing = resolve_publication(&bib, "turing1950", None).unwrap();
    assert_eq!(turing.pubname, "Mind");
    assert_eq!(turing.copyright_holder, "Oxford University Press");

    // override wins without touching the entry
    let overridden = resolve_publication(&bib, "nopub2022", Some("The Authors")).unwrap();
    assert_eq!(overridden.copyright_holder, "The Authors");
}

// ── Real-compiler test (needs a TeX installation) ────────────────────────────

#[test]
fn e2e_real_latexmk() {
    if std::env::var("E2E_LATEX").is_err() {
        println!("SKIP — set E2E_LATEX=1 to run the real latexmk test");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let bib = write_bib(dir.path());
    let input = dir.path().join("accepted.pdf");
    write_pdf(&input);
    let output = dir.path().join("out").join("smith2020.pdf");

    let config = AnnotateConfig::builder()
        .bibliography(&bib)
        .key("smith2020")
        .build()
        .unwrap();

    let report = annotate(&input, &output, &config).expect("latexmk run should succeed");
    assert!(output.is_file());
    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF"), "output is not a PDF");
    assert!(report.compile_duration_ms > 0);
}
