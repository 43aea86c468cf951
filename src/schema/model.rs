use crate::error::GenerateError;
use crate::prompt::extract_payload;
use serde::Serialize;

/// One row of the learning-activity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityInfo {
    pub name: String,
    pub teacher_activity: String,
    pub student_activity: String,
    pub activity_intent: String,
}

impl ActivityInfo {
    /// Looks up a field by its payload key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "teacher_activity" => Some(&self.teacher_activity),
            "student_activity" => Some(&self.student_activity),
            "activity_intent" => Some(&self.activity_intent),
            _ => None,
        }
    }
}

/// One row of the thinking-training table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReflectionPoint {
    pub point_type: String,
    pub description: String,
}

impl ReflectionPoint {
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "point_type" => Some(&self.point_type),
            "description" => Some(&self.description),
            _ => None,
        }
    }
}

/// A validated teaching design, ready to be bound into a template.
///
/// Instances only come out of [`crate::schema::validate`], so every field is
/// present and every activity carries its own intent. The value is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeachingDesignData {
    lesson_name: String,
    grade_level: String,
    subject: String,
    textbook_version: String,
    lesson_period: String,
    teacher_school: String,
    teacher_name: String,
    summary: String,
    content_analysis: String,
    learner_analysis: String,
    learning_objectives: String,
    lesson_structure: String,
    learning_activities: Vec<ActivityInfo>,
    blackboard_design: String,
    homework_extension: String,
    materials_design: String,
    reflection_thinking_points: Vec<ReflectionPoint>,
}

/// Builder used by the validator once every field has been checked.
#[derive(Default)]
pub(crate) struct DataParts {
    pub scalars: ahash::AHashMap<&'static str, String>,
    pub activities: Vec<ActivityInfo>,
    pub reflections: Vec<ReflectionPoint>,
}

impl DataParts {
    pub(crate) fn finish(mut self) -> TeachingDesignData {
        let mut take = |key: &str| self.scalars.remove(key).unwrap_or_default();
        TeachingDesignData {
            lesson_name: take("lesson_name"),
            grade_level: take("grade_level"),
            subject: take("subject"),
            textbook_version: take("textbook_version"),
            lesson_period: take("lesson_period"),
            teacher_school: take("teacher_school"),
            teacher_name: take("teacher_name"),
            summary: take("summary"),
            content_analysis: take("content_analysis"),
            learner_analysis: take("learner_analysis"),
            learning_objectives: take("learning_objectives"),
            lesson_structure: take("lesson_structure"),
            blackboard_design: take("blackboard_design"),
            homework_extension: take("homework_extension"),
            materials_design: take("materials_design"),
            learning_activities: self.activities,
            reflection_thinking_points: self.reflections,
        }
    }
}

impl TeachingDesignData {
    /// Parses and validates a raw JSON document (or a model response wrapping one).
    pub fn from_json_str(text: &str) -> Result<Self, GenerateError> {
        let payload = extract_payload(text)?;
        Ok(super::validate(&payload)?)
    }

    /// Looks up a scalar field by its payload key.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        let value = match key {
            "lesson_name" => &self.lesson_name,
            "grade_level" => &self.grade_level,
            "subject" => &self.subject,
            "textbook_version" => &self.textbook_version,
            "lesson_period" => &self.lesson_period,
            "teacher_school" => &self.teacher_school,
            "teacher_name" => &self.teacher_name,
            "summary" => &self.summary,
            "content_analysis" => &self.content_analysis,
            "learner_analysis" => &self.learner_analysis,
            "learning_objectives" => &self.learning_objectives,
            "lesson_structure" => &self.lesson_structure,
            "blackboard_design" => &self.blackboard_design,
            "homework_extension" => &self.homework_extension,
            "materials_design" => &self.materials_design,
            _ => return None,
        };
        Some(value)
    }

    /// All scalar fields in catalogue order.
    pub fn scalars(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        super::SCALAR_FIELDS
            .iter()
            .filter_map(|spec| self.scalar(spec.key).map(|value| (spec.key, value)))
    }

    pub fn lesson_name(&self) -> &str {
        &self.lesson_name
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn learning_objectives(&self) -> &str {
        &self.learning_objectives
    }

    pub fn learning_activities(&self) -> &[ActivityInfo] {
        &self.learning_activities
    }

    pub fn reflection_thinking_points(&self) -> &[ReflectionPoint] {
        &self.reflection_thinking_points
    }

    /// Re-emits the data in the wire format it was validated from.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
