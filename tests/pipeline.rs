//! End-to-end tests of the generation contract.
//!
mod common;
use common::*;
use jiaoan::docx::{check_upload, extract_text};
use jiaoan::prelude::*;
use std::fs;

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn test_generate_renders_valid_payload() {
        let processor = default_processor();
        let document = generate(&scenario_payload(), &processor).expect("generation succeeds");
        assert_eq!(activity_rows(document.bytes()).len(), 2);
    }

    #[test]
    fn test_invalid_payload_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut payload = scenario_payload();
        payload["learning_activities"][1]
            .as_object_mut()
            .unwrap()
            .remove("activity_intent");

        let result = generate(&payload, &default_processor())
            .and_then(|doc| doc.write_to(dir.path().join("out.docx")).map_err(Into::into));

        match result {
            Err(GenerateError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(
                    errors.as_slice()[0].path,
                    FieldPath::element("learning_activities", 1, Some("activity_intent"))
                );
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_generate_from_fenced_response() {
        let response = format!(
            "好的，以下是教学设计：\n```json\n{}\n```",
            serde_json::to_string_pretty(&scenario_payload()).unwrap()
        );
        let document = generate_from_response(&response, &default_processor()).unwrap();
        assert!(extract_text(document.bytes()).unwrap().contains("Spring Lesson"));
    }

    #[test]
    fn test_unparseable_response_is_a_payload_error() {
        let err = generate_from_response("模型超时", &default_processor()).unwrap_err();
        assert!(matches!(err, GenerateError::Payload(PayloadError::NoJsonObject)));
    }

    #[test]
    fn test_unique_output_names_do_not_collide() {
        let names: std::collections::HashSet<String> =
            (0..100).map(|_| unique_output_name("春")).collect();
        assert_eq!(names.len(), 100);
    }

    #[test]
    fn test_check_upload_accepts_rendered_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.docx");
        let document = generate(&scenario_payload(), &default_processor()).unwrap();
        document.write_to(&path).unwrap();

        let check = check_upload(&path).expect("upload is a valid package");
        assert_eq!(check.size, document.bytes().len() as u64);
        assert_eq!(check.table_count, 3);
        assert!(check.warnings.is_empty());
    }

    #[test]
    fn test_check_upload_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            check_upload(&dir.path().join("absent.docx")),
            Err(TemplateError::NotFound(_))
        ));

        let text = dir.path().join("notes.txt");
        fs::write(&text, "hello").unwrap();
        assert!(check_upload(&text).is_err());

        let empty = dir.path().join("empty.docx");
        fs::write(&empty, b"").unwrap();
        assert!(check_upload(&empty).is_err());
    }
}
