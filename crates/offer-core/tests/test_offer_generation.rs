use async_trait::async_trait;
use offer_core::clients::{LibreOfficeConverter, OfferEmail};
use offer_core::docx::DocxPackage;
use offer_core::{
    fill_offer_letter, CandidateData, CompanyProfile, GenerateOptions, OfferError, OfferMailer,
    OfferPipeline, OfferSettings, PdfConverter, Result,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;
const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

fn row(label: &str, amount: &str) -> String {
    format!(
        r#"<w:tr><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{}</w:t></w:r></w:p></w:tc></w:tr>"#,
        label, amount
    )
}

/// Template modelled on the studio's letter: split tokens, a details table and Schedule 1
fn template_xml() -> String {
    let mut body = String::new();
    body.push_str(r#"<w:p><w:pPr><w:jc w:val="right"/></w:pPr><w:r><w:t>Date: {{Acceptance Date}}</w:t></w:r></w:p>"#);
    body.push_str(r#"<w:p><w:r><w:t xml:space="preserve">Dear </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>{{Candidate Name}}</w:t></w:r><w:r><w:t>,</w:t></w:r></w:p>"#);
    // Word split this token while it was being edited
    body.push_str(r#"<w:p><w:r><w:t xml:space="preserve">We are pleased to offer you the role of {{Job </w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>Title}}</w:t></w:r><w:r><w:t xml:space="preserve"> starting {{Joining Date}}.</w:t></w:r></w:p>"#);
    body.push_str(r#"<w:p><w:r><w:t>This offer is valid for {{Offer Validity Days}} days.</w:t></w:r></w:p>"#);
    body.push_str("<w:tbl>");
    body.push_str(&row("Interview", "{{Interview Date}}"));
    body.push_str(&row("Probation", "{{Probation Period Months}} months at {{Probation Monthly Salary}}"));
    body.push_str("</w:tbl>");
    body.push_str(r#"<w:p><w:r><w:t>Schedule 1</w:t></w:r></w:p>"#);
    body.push_str("<w:tbl>");
    body.push_str(&row("Component", "Monthly (INR)"));
    body.push_str(&row("Basic", ""));
    body.push_str(&row("Conveyance", "1,600"));
    body.push_str(&row("Cost to Company Compensation", ""));
    body.push_str("</w:tbl>");
    body.push_str(r#"<w:p><w:r><w:t>Candidate Signature: ____________</w:t></w:r></w:p>"#);

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
        ),
        body
    )
}

fn write_template(path: &Path) {
    let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("word/document.xml", template_xml()),
        ("word/_rels/document.xml.rels", RELS.to_string()),
        ("word/styles.xml", "<w:styles/>".to_string()),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

const PROFILE_JSON: &str = r#"{
    "company_name": "The Melange Studio",
    "template_docx": "template.docx",
    "offer_validity_days": 2,
    "probation_months": 3,
    "email": "hr@melange.example",
    "app_password": "abcd efgh ijkl mnop",
    "schedule_1_config": {
        "use_lower_bound": true,
        "all_same_value": true,
        "fill_rows": ["Basic", "Cost to Company Compensation"]
    }
}"#;

fn candidate() -> CandidateData {
    serde_json::from_str(
        r#"{
            "name": "Mariya Fatima",
            "email": "mariya@example.com",
            "position": "Interior Designer",
            "start_date": "1st December 2025",
            "salary": "13,000-15,000/-",
            "test_date": "20th November 2025"
        }"#,
    )
    .unwrap()
}

struct Workspace {
    _temp: tempfile::TempDir,
    settings: OfferSettings,
}

fn workspace() -> Workspace {
    let temp = tempfile::tempdir().unwrap();
    let profile_dir = temp.path().join("profiles/melange");
    std::fs::create_dir_all(&profile_dir).unwrap();
    std::fs::write(profile_dir.join("config.json"), PROFILE_JSON).unwrap();
    write_template(&profile_dir.join("template.docx"));

    let settings = OfferSettings {
        profiles_dir: temp.path().join("profiles"),
        output_dir: temp.path().join("output"),
        candidates_dir: temp.path().join("candidates"),
        web_dir: temp.path().join("web"),
        ..Default::default()
    };
    Workspace {
        _temp: temp,
        settings,
    }
}

fn signature_png() -> Vec<u8> {
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.extend_from_slice(&13u32.to_be_bytes());
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&400u32.to_be_bytes());
    png.extend_from_slice(&100u32.to_be_bytes());
    png.extend_from_slice(&[8, 6, 0, 0, 0]);
    png
}

/// Writes a stub PDF where the office suite would
#[derive(Default)]
struct StubConverter {
    calls: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl PdfConverter for StubConverter {
    async fn convert(&self, docx: &Path, out_dir: &Path) -> Result<PathBuf> {
        self.calls.lock().unwrap().push(docx.to_path_buf());
        let pdf = LibreOfficeConverter::output_path(docx, out_dir)?;
        std::fs::write(&pdf, b"%PDF-1.7 stub")?;
        Ok(pdf)
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OfferEmail>>,
}

#[async_trait]
impl OfferMailer for RecordingMailer {
    async fn send(&self, _profile: &CompanyProfile, email: &OfferEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[test]
fn test_fill_offer_letter_end_to_end() {
    let ws = workspace();
    let profile = CompanyProfile::load(&ws.settings.profiles_dir, "melange").unwrap();

    let package = fill_offer_letter(&profile.template_path(), &candidate(), &profile).unwrap();
    let reopened = DocxPackage::from_bytes(&package.to_bytes().unwrap()).unwrap();
    let document = reopened.document().unwrap();

    let text = document.full_text();
    assert!(!text.contains("{{"), "no placeholder left: {}", text);
    assert!(text.contains("Date: \n"), "acceptance date is blank");
    assert!(text.contains("Dear Mariya Fatima,"));
    assert!(text.contains("the role of Interior Designer starting 1st December 2025."));
    assert!(text.contains("valid for 2 days"));
    assert!(text.contains("20th November 2025"));
    assert!(text.contains("3 months at 13,000-15,000/-"));

    let schedule = document.tables().nth(1).unwrap();
    let amounts: Vec<String> = schedule
        .rows()
        .iter()
        .map(|r| r.cells()[1].text())
        .collect();
    assert_eq!(amounts, vec!["Monthly (INR)", "13,000", "1,600", "13,000"]);

    let xml = document.to_xml();
    assert!(
        xml.contains(r#"<w:r><w:rPr><w:b/></w:rPr><w:t>Mariya Fatima</w:t></w:r>"#),
        "bold run keeps its formatting"
    );
    assert!(xml.contains(r#"<w:jc w:val="right"/>"#), "paragraph properties survive");

    // untouched parts are carried over byte for byte
    assert_eq!(reopened.part("word/styles.xml"), Some(&b"<w:styles/>"[..]));
}

#[tokio::test]
async fn test_pipeline_generate_without_pdf() {
    let ws = workspace();
    let converter = Arc::new(StubConverter::default());
    let mailer = Arc::new(RecordingMailer::default());
    let pipeline = OfferPipeline::new(ws.settings.clone(), converter.clone(), mailer.clone());

    let options = GenerateOptions {
        convert_pdf: false,
        send_email: true,
    };
    let generated = pipeline.generate("melange", &candidate(), options).await.unwrap();

    assert_eq!(
        generated.docx_path,
        ws.settings.output_dir.join("melange/offer_letter_Mariya_Fatima.docx")
    );
    assert!(generated.docx_path.is_file());
    assert!(generated.pdf_path.is_none());
    assert!(!generated.emailed, "nothing to attach without a PDF");
    assert!(converter.calls.lock().unwrap().is_empty());
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_pipeline_generate_convert_and_email() {
    let ws = workspace();
    let mailer = Arc::new(RecordingMailer::default());
    let mut settings = ws.settings.clone();
    settings.server.portal_url = Some("https://offers.example/sign".to_string());
    let pipeline = OfferPipeline::new(settings, Arc::new(StubConverter::default()), mailer.clone());

    let options = GenerateOptions {
        convert_pdf: true,
        send_email: true,
    };
    let generated = pipeline.generate("melange", &candidate(), options).await.unwrap();

    assert_eq!(
        generated.pdf_path.as_deref(),
        Some(ws.settings.output_dir.join("melange/offer_letter_Mariya_Fatima.pdf").as_path())
    );
    assert!(generated.emailed);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "mariya@example.com");
    assert_eq!(sent[0].subject, "Offer Letter - Interior Designer Position at The Melange Studio");
    assert_eq!(sent[0].attachment_name, "Offer_Letter_Mariya_Fatima.pdf");
    assert_eq!(sent[0].attachment, b"%PDF-1.7 stub");
    assert!(sent[0].body.contains("https://offers.example/sign"));
}

#[tokio::test]
async fn test_send_offer_requires_generated_pdf() {
    let ws = workspace();
    let pipeline = OfferPipeline::new(
        ws.settings.clone(),
        Arc::new(StubConverter::default()),
        Arc::new(RecordingMailer::default()),
    );

    let err = pipeline.send_offer("melange", &candidate()).await.unwrap_err();
    assert!(matches!(err, OfferError::NotFound(_)));
    assert!(err.to_string().contains("generate"));
}

#[tokio::test]
async fn test_sign_generated_offer() {
    let ws = workspace();
    let converter = Arc::new(StubConverter::default());
    let pipeline = OfferPipeline::new(
        ws.settings.clone(),
        converter.clone(),
        Arc::new(RecordingMailer::default()),
    );

    let options = GenerateOptions {
        convert_pdf: false,
        send_email: false,
    };
    pipeline.generate("melange", &candidate(), options).await.unwrap();

    let signed = pipeline
        .sign("melange", "Mariya_Fatima", &signature_png(), Some("5th December 2025"))
        .await
        .unwrap();

    let out = ws.settings.output_dir.join("melange");
    assert_eq!(signed.signature_path, out.join("signature_Mariya_Fatima.png"));
    assert_eq!(std::fs::read(&signed.signature_path).unwrap(), signature_png());
    assert_eq!(signed.signed_docx, out.join("offer_letter_Mariya_Fatima_signed.docx"));
    assert_eq!(signed.signed_pdf, out.join("offer_letter_Mariya_Fatima_signed.pdf"));
    assert_eq!(converter.calls.lock().unwrap().as_slice(), [signed.signed_docx.clone()]);

    let package = DocxPackage::open(&signed.signed_docx).unwrap();
    assert!(package.part("word/media/signature_1.png").is_some());

    let document = package.document().unwrap();
    let paragraphs: Vec<String> = document.paragraphs().map(|p| p.text()).collect();
    let marker = paragraphs
        .iter()
        .position(|p| p.starts_with("Candidate Signature:"))
        .unwrap();
    assert_eq!(paragraphs[marker + 1], "");
    assert_eq!(paragraphs[marker + 2], "Date: 5th December 2025");
    // 400x100 image drawn 2 inches wide
    assert!(document.to_xml().contains(r#"cx="1828800" cy="457200""#));

    // the unsigned letter is left as it was
    let unsigned = DocxPackage::open(out.join("offer_letter_Mariya_Fatima.docx")).unwrap();
    assert!(unsigned.part("word/media/signature_1.png").is_none());
}

#[tokio::test]
async fn test_invalid_resubmission_keeps_earlier_signature() {
    let ws = workspace();
    let converter = Arc::new(StubConverter::default());
    let pipeline = OfferPipeline::new(
        ws.settings.clone(),
        converter.clone(),
        Arc::new(RecordingMailer::default()),
    );

    let options = GenerateOptions {
        convert_pdf: false,
        send_email: false,
    };
    pipeline.generate("melange", &candidate(), options).await.unwrap();
    let signed = pipeline
        .sign("melange", "Mariya_Fatima", &signature_png(), None)
        .await
        .unwrap();

    let err = pipeline
        .sign("melange", "Mariya_Fatima", b"not an image", None)
        .await
        .unwrap_err();
    assert!(matches!(err, OfferError::Validation(_)));
    assert_eq!(std::fs::read(&signed.signature_path).unwrap(), signature_png());
    assert_eq!(converter.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sign_rejects_traversal() {
    let ws = workspace();
    let pipeline = OfferPipeline::new(
        ws.settings.clone(),
        Arc::new(StubConverter::default()),
        Arc::new(RecordingMailer::default()),
    );

    let err = pipeline
        .sign("melange", "../../etc/passwd", &signature_png(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, OfferError::Validation(_)));
}

#[tokio::test]
async fn test_render_docx_for_unknown_profile() {
    let ws = workspace();
    let pipeline = OfferPipeline::from_settings(ws.settings.clone());

    let err = pipeline.render_docx("acme", &candidate()).await.unwrap_err();
    assert!(matches!(err, OfferError::ProfileNotFound { .. }));
}
