//! Instructions for the remote model and extraction of its JSON answer.
//!
//! The JSON skeleton embedded in the prompt is generated from the field
//! catalogue, so the wire format the model is asked for always matches what
//! [`crate::schema::validate`] accepts.

use crate::error::PayloadError;
use crate::schema::{FieldSlot, FieldSpec, ListSpec, document_order};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt::Write;

/// Number of sample elements shown for each list in the skeleton.
const SKELETON_LIST_ITEMS: usize = 2;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid regex"));

/// Builds the full generation prompt for one uploaded document.
///
/// `material` is the plain text extracted from the upload and `template_text`
/// the plain text of the selected template.
pub fn generation_prompt(material: &str, template_text: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "你是一位精通教学法和课程设计的专家。请基于\"思维发展型课堂\"模型，根据用户提供的学习材料，创建一份全面、高质量的教学设计。\n\n",
    );
    prompt.push_str("**重要：请严格按照以下JSON格式输出结果，不要包含任何其他文字或解释。**\n\n");
    prompt.push_str("**输入材料：**\n1. 用户上传的学习材料内容：\n");
    prompt.push_str(material);
    prompt.push_str("\n\n2. 教学设计模板内容：\n");
    prompt.push_str(template_text);
    prompt.push_str("\n\n**输出要求：**\n请分析学习材料，并严格按照以下JSON格式输出教学设计数据：\n\n```json\n");
    prompt.push_str(&json_skeleton());
    prompt.push_str("\n```\n\n");
    prompt.push_str(GUIDELINES);
    prompt
}

/// Describes every required field, one per line.
pub fn schema_prompt() -> String {
    let mut out = String::from("**JSON Schema 说明：**\n\n必需字段：\n");
    for slot in document_order() {
        match slot {
            FieldSlot::Scalar(spec) => {
                let _ = writeln!(out, "- {}: {}", spec.key, spec.label);
            }
            FieldSlot::List(spec) => {
                let _ = writeln!(out, "- {}: {}（数组）", spec.key, spec.label);
            }
        }
    }
    for slot in document_order() {
        if let FieldSlot::List(spec) = slot {
            let _ = writeln!(out, "\n{} 数组元素结构：", spec.key);
            for field in spec.item_fields {
                let _ = writeln!(out, "- {}: {}", field.key, field.description);
            }
        }
    }
    out.push_str("\n每个 learning_activities 元素都必须包含自己的 activity_intent，不要输出文档级的 activity_intent 字段。\n");
    out
}

/// The JSON shape requested from the model, with descriptions as values.
pub fn json_skeleton() -> String {
    let slots = document_order();
    let mut out = String::from("{\n");
    for (i, slot) in slots.iter().enumerate() {
        let separator = if i + 1 == slots.len() { "" } else { "," };
        match slot {
            FieldSlot::Scalar(spec) => {
                let _ = writeln!(
                    out,
                    "    {}: {}{}",
                    quote(spec.key),
                    quote(spec.description),
                    separator
                );
            }
            FieldSlot::List(spec) => {
                let _ = writeln!(out, "    {}: [", quote(spec.key));
                write_list_items(&mut out, spec);
                let _ = writeln!(out, "    ]{}", separator);
            }
        }
    }
    out.push('}');
    out
}

fn write_list_items(out: &mut String, spec: &ListSpec) {
    for item in 0..SKELETON_LIST_ITEMS {
        out.push_str("        {\n");
        write_item_fields(out, spec.item_fields);
        let separator = if item + 1 == SKELETON_LIST_ITEMS { "" } else { "," };
        let _ = writeln!(out, "        }}{}", separator);
    }
}

fn write_item_fields(out: &mut String, fields: &[FieldSpec]) {
    for (i, field) in fields.iter().enumerate() {
        let separator = if i + 1 == fields.len() { "" } else { "," };
        let _ = writeln!(
            out,
            "            {}: {}{}",
            quote(field.key),
            quote(field.description),
            separator
        );
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

const GUIDELINES: &str = "**内容生成指南：**

1. **课例名称**：使用学习材料的标题或核心主题
2. **学段年级**：根据材料内容复杂程度推断合适的学段年级
3. **学科**：识别对应的学科
4. **摘要**：300-500字，包含核心主题、传统教学痛点、本课教学方法特色
5. **学习目标**：3-4个具体可测量的目标，使用行为动词（如\"列举\"、\"对比\"、\"设计\"、\"总结\"），避免模糊词汇（如\"了解\"、\"知道\"、\"掌握\"），标注重点和难点。学习目标必须以字符串格式输出，每行一个目标
6. **学习活动**：设计3-5个教学环节，每个环节包含教师活动、学生活动和该环节自己的活动意图
7. **思维训练点**：重点关注认知冲突、思维图示、变式运用三个方面

**注意：**
- 必须严格按照JSON格式输出
- 不要包含任何markdown格式标记
- 不要包含任何解释性文字
- 确保JSON格式正确，可以被解析
- 所有字段都必须填写，不能为空

现在请开始分析学习材料并生成教学设计JSON数据：";

/// Pulls the JSON object out of a model response.
///
/// Markdown code fences and surrounding prose are tolerated: when the response
/// is not JSON as a whole, the text between the first `{` and the last `}` is
/// parsed. Syntax errors are reported as [`PayloadError::Json`], distinct from
/// schema validation failures.
pub fn extract_payload(response: &str) -> Result<Value, PayloadError> {
    let body = CODE_FENCE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map_or(response, |m| m.as_str())
        .trim();

    let value = if body.starts_with('{') || body.starts_with('[') {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(whole) => match object_slice(body) {
                Some(slice) if slice.len() < body.len() => parse_json(slice)?,
                _ => return Err(PayloadError::Json(whole.to_string())),
            },
        }
    } else {
        parse_json(object_slice(body).ok_or(PayloadError::NoJsonObject)?)?
    };

    if value.is_object() {
        Ok(value)
    } else {
        Err(PayloadError::NotAnObject(crate::schema::value_kind(&value)))
    }
}

fn object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

fn parse_json(text: &str) -> Result<Value, PayloadError> {
    serde_json::from_str(text).map_err(|e| PayloadError::Json(e.to_string()))
}
