//! The field catalogue shared by the validator, the prompt builder and the
//! default template. Renaming a key here renames it everywhere.

/// Current payload revision. Revision 1 carried a single document-level
/// `activity_intent`; revision 2 moved it into every learning activity.
pub const SCHEMA_VERSION: u32 = 2;

/// The revision-1 key that is now rejected at document level.
pub const LEGACY_ACTIVITY_INTENT: &str = "activity_intent";

pub const ACTIVITIES_KEY: &str = "learning_activities";
pub const REFLECTIONS_KEY: &str = "reflection_thinking_points";

/// Describes one text field of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    /// Caption used in the generated template and prompt.
    pub label: &'static str,
    /// Instruction given to the remote model for this field.
    pub description: &'static str,
}

/// Describes a list-of-records field of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Scalar key after which this list appears in document order.
    pub after: &'static str,
    pub item_fields: &'static [FieldSpec],
    /// Whether every item field must be a non-empty string.
    pub require_non_empty: bool,
}

const fn field(key: &'static str, label: &'static str, description: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        description,
    }
}

pub const SCALAR_FIELDS: &[FieldSpec] = &[
    field("lesson_name", "课例名称", "课例名称（使用学习材料的标题或核心主题）"),
    field("grade_level", "学段年级", "学段年级（如：小学一年级、初中二年级、高中一年级）"),
    field("subject", "学科", "学科（如：语文、数学、英语、物理、化学、生物、历史、地理、政治）"),
    field("textbook_version", "教材版本", "教材版本（如：人教版、苏教版、北师大版等，或填写'根据所给材料'）"),
    field("lesson_period", "课时", "课时说明（如：第1课时）"),
    field("teacher_school", "学校", "教师单位（如：XX学校）"),
    field("teacher_name", "教师", "教师姓名（如：XX教师）"),
    field("summary", "课例概述", "摘要（300-500字，概括课程核心主题、传统教学痛点、本课教学方法特色）"),
    field("content_analysis", "内容分析", "教学内容分析（分析核心知识点和技能要求，在课程体系中的位置）"),
    field("learner_analysis", "学习者分析", "学习者分析（根据学段年级描述学生特征、已有知识水平、认知发展阶段）"),
    field("learning_objectives", "学习目标及重难点", "学习目标及重难点（3-4个具体可测量的目标，使用行为动词，每行一个目标，标注重点和难点）"),
    field("lesson_structure", "教学设计思路", "课例结构（整体教学流程，如：导入→新知探究→巩固练习→总结与拓展）"),
    field("blackboard_design", "板书设计", "板书设计（用文本描述板书布局，包括关键术语、图示和总结）"),
    field("homework_extension", "作业与拓展", "作业与拓展学习设计（1-2个家庭作业或拓展活动）"),
    field("materials_design", "学习素材设计", "素材设计（学习单、练习纸等，如无则写'本课未设计额外学习素材'）"),
];

pub const ACTIVITY_FIELDS: &[FieldSpec] = &[
    field("name", "环节名称", "活动环节名称"),
    field("teacher_activity", "教师活动", "教师活动描述"),
    field("student_activity", "学生活动", "学生活动描述"),
    field("activity_intent", "活动意图", "本环节的活动意图（说明该环节的教学目的和如何达成学习目标）"),
];

pub const REFLECTION_FIELDS: &[FieldSpec] = &[
    field("point_type", "训练点类型", "思维训练点类型（认知冲突、思维图示、变式运用）"),
    field("description", "具体描述", "说明（100字以内）"),
];

pub const LIST_FIELDS: &[ListSpec] = &[
    ListSpec {
        key: ACTIVITIES_KEY,
        label: "学习活动设计",
        description: "学习活动列表（3-5个教学环节，每个环节包含教师活动、学生活动和活动意图）",
        after: "lesson_structure",
        item_fields: ACTIVITY_FIELDS,
        require_non_empty: true,
    },
    ListSpec {
        key: REFLECTIONS_KEY,
        label: "思维训练点设计",
        description: "思维训练点列表（重点关注认知冲突、思维图示、变式运用三个方面）",
        after: "materials_design",
        item_fields: REFLECTION_FIELDS,
        require_non_empty: false,
    },
];

/// A scalar or list entry of the payload, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSlot {
    Scalar(&'static FieldSpec),
    List(&'static ListSpec),
}

impl FieldSlot {
    pub fn key(&self) -> &'static str {
        match self {
            FieldSlot::Scalar(spec) => spec.key,
            FieldSlot::List(spec) => spec.key,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldSlot::Scalar(spec) => spec.label,
            FieldSlot::List(spec) => spec.label,
        }
    }
}

/// All payload fields in the order they appear in a teaching design.
pub fn document_order() -> Vec<FieldSlot> {
    let mut slots = Vec::with_capacity(SCALAR_FIELDS.len() + LIST_FIELDS.len());
    for spec in SCALAR_FIELDS {
        slots.push(FieldSlot::Scalar(spec));
        slots.extend(
            LIST_FIELDS
                .iter()
                .filter(|list| list.after == spec.key)
                .map(FieldSlot::List),
        );
    }
    slots
}

pub fn scalar_spec(key: &str) -> Option<&'static FieldSpec> {
    SCALAR_FIELDS.iter().find(|spec| spec.key == key)
}

pub fn list_spec(key: &str) -> Option<&'static ListSpec> {
    LIST_FIELDS.iter().find(|spec| spec.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_order_places_lists_after_their_anchor() {
        let keys: Vec<_> = document_order().iter().map(FieldSlot::key).collect();
        let structure = keys.iter().position(|k| *k == "lesson_structure").unwrap();
        assert_eq!(keys[structure + 1], ACTIVITIES_KEY);
        assert_eq!(keys.last().copied(), Some(REFLECTIONS_KEY));
        assert_eq!(keys.len(), SCALAR_FIELDS.len() + LIST_FIELDS.len());
    }

    #[test]
    fn activity_intent_is_only_a_per_activity_field() {
        assert!(scalar_spec(LEGACY_ACTIVITY_INTENT).is_none());
        assert!(ACTIVITY_FIELDS.iter().any(|f| f.key == "activity_intent"));
    }
}
