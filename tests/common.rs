//! Common test utilities for building payloads, templates and reading rendered tables.
use jiaoan::docx::{Package, TableText, extract_tables};
use jiaoan::prelude::*;
use serde_json::{Value, json};

/// An activity as `(name, teacher_activity, student_activity, activity_intent)`.
pub type ActivityRow<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Every scalar field filled in, with the given activities and one reflection point.
#[allow(dead_code)]
pub fn payload_with_activities(activities: &[ActivityRow]) -> Value {
    let activities: Vec<Value> = activities
        .iter()
        .map(|(name, teacher, student, intent)| {
            json!({
                "name": name,
                "teacher_activity": teacher,
                "student_activity": student,
                "activity_intent": intent,
            })
        })
        .collect();

    json!({
        "lesson_name": "Spring Lesson",
        "grade_level": "初中一年级",
        "subject": "语文",
        "textbook_version": "人教版",
        "lesson_period": "第1课时",
        "teacher_school": "实验中学",
        "teacher_name": "李老师",
        "summary": "以朗读带动品析，感受春天的生机。",
        "content_analysis": "《春》是写景散文的典范。",
        "learner_analysis": "学生已有一定的朗读基础。",
        "learning_objectives": "1. 有感情地朗读课文\n2. 品味比喻和拟人的表达效果",
        "lesson_structure": "导入→朗读→品析→拓展",
        "blackboard_design": "春：盼春 绘春 赞春",
        "homework_extension": "仿写一段写景文字。",
        "materials_design": "本课未设计额外学习素材",
        "learning_activities": activities,
        "reflection_thinking_points": [
            {"point_type": "认知冲突", "description": "春天为什么“欣欣然”？"}
        ]
    })
}

/// The two-activity example used throughout the documentation.
#[allow(dead_code)]
pub fn scenario_payload() -> Value {
    payload_with_activities(&[
        ("Intro", "Play music", "Listen", "Spark interest"),
        ("Reading", "Guide reading", "Read aloud", "Build comprehension"),
    ])
}

/// `count` activities with distinct names `活动1`, `活动2`, ….
#[allow(dead_code)]
pub fn numbered_payload(count: usize) -> Value {
    let names: Vec<(String, String)> = (1..=count)
        .map(|i| (format!("活动{}", i), format!("意图{}", i)))
        .collect();
    let rows: Vec<ActivityRow> = names
        .iter()
        .map(|(name, intent)| (name.as_str(), "教师讲解", "学生思考", intent.as_str()))
        .collect();
    payload_with_activities(&rows)
}

#[allow(dead_code)]
pub fn valid_data(payload: &Value) -> TeachingDesignData {
    validate(payload).expect("payload should be valid")
}

/// A processor over the built-in template.
#[allow(dead_code)]
pub fn default_processor() -> TemplateProcessor {
    TemplateProcessor::builder(default_template().expect("default template builds"))
        .build()
        .expect("default template parses")
}

/// A processor over a template whose body is `body_xml`.
#[allow(dead_code)]
pub fn processor_for_body(body_xml: &str, strict: bool) -> TemplateProcessor {
    let bytes = Package::from_document_body(body_xml)
        .to_bytes()
        .expect("package writes");
    TemplateProcessor::builder(bytes)
        .strict(strict)
        .build()
        .expect("template parses")
}

/// A paragraph with a single run.
#[allow(dead_code)]
pub fn para(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
}

/// A table row with one single-paragraph cell per entry.
#[allow(dead_code)]
pub fn row(cells: &[&str]) -> String {
    let cells: String = cells
        .iter()
        .map(|c| format!("<w:tc>{}</w:tc>", para(c)))
        .collect();
    format!("<w:tr>{}</w:tr>", cells)
}

#[allow(dead_code)]
pub fn table(rows: &[String]) -> String {
    format!("<w:tbl>{}</w:tbl>", rows.concat())
}

/// The rows below the header of the first table whose header starts with `header`.
#[allow(dead_code)]
pub fn table_rows(docx: &[u8], header: &str) -> Vec<Vec<String>> {
    let tables: Vec<TableText> = extract_tables(docx).expect("rendered document reads back");
    tables
        .into_iter()
        .find(|t| t.first().and_then(|r| r.first()).map(String::as_str) == Some(header))
        .map(|t| t.into_iter().skip(1).collect())
        .unwrap_or_default()
}

#[allow(dead_code)]
pub fn activity_rows(docx: &[u8]) -> Vec<Vec<String>> {
    table_rows(docx, "环节名称")
}

#[allow(dead_code)]
pub fn reflection_rows(docx: &[u8]) -> Vec<Vec<String>> {
    table_rows(docx, "训练点类型")
}

#[allow(dead_code)]
pub fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}
