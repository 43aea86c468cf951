//! The explicit mapping between payload fields and template placeholder names.

use super::context::{Record, TemplateContext, format_learning_objectives};
use super::inspect::TemplateInfo;
use crate::schema::{
    ACTIVITIES_KEY, LEGACY_ACTIVITY_INTENT, LIST_FIELDS, REFLECTIONS_KEY, SCALAR_FIELDS,
    TeachingDesignData,
};
use serde::{Deserialize, Serialize};

/// Binds one payload field to one placeholder name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub field: String,
    pub placeholder: String,
}

impl Binding {
    fn identity(key: &str) -> Self {
        Self {
            field: key.to_string(),
            placeholder: key.to_string(),
        }
    }
}

/// Binds a payload list to the list a row loop iterates, and its item fields
/// to the columns read from the loop variable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegionBinding {
    pub list: String,
    pub placeholder_list: String,
    pub columns: Vec<Binding>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    pub scalars: Vec<Binding>,
    pub regions: Vec<RegionBinding>,
}

impl Default for BindingTable {
    /// Every field bound to the placeholder of the same name.
    fn default() -> Self {
        Self {
            scalars: SCALAR_FIELDS.iter().map(|f| Binding::identity(f.key)).collect(),
            regions: LIST_FIELDS
                .iter()
                .map(|list| RegionBinding {
                    list: list.key.to_string(),
                    placeholder_list: list.key.to_string(),
                    columns: list
                        .item_fields
                        .iter()
                        .map(|f| Binding::identity(f.key))
                        .collect(),
                })
                .collect(),
        }
    }
}

impl BindingTable {
    /// Binds scalar `field` to `placeholder`.
    pub fn rename(mut self, field: &str, placeholder: &str) -> Self {
        match self.scalars.iter_mut().find(|b| b.field == field) {
            Some(binding) => binding.placeholder = placeholder.to_string(),
            None => self.scalars.push(Binding {
                field: field.to_string(),
                placeholder: placeholder.to_string(),
            }),
        }
        self
    }

    /// Binds payload list `list` to the loop list `placeholder_list`.
    pub fn rename_list(mut self, list: &str, placeholder_list: &str) -> Self {
        if let Some(region) = self.regions.iter_mut().find(|r| r.list == list) {
            region.placeholder_list = placeholder_list.to_string();
        }
        self
    }

    /// Binds item field `field` of `list` to the loop column `placeholder`.
    pub fn rename_column(mut self, list: &str, field: &str, placeholder: &str) -> Self {
        if let Some(region) = self.regions.iter_mut().find(|r| r.list == list) {
            match region.columns.iter_mut().find(|c| c.field == field) {
                Some(column) => column.placeholder = placeholder.to_string(),
                None => region.columns.push(Binding {
                    field: field.to_string(),
                    placeholder: placeholder.to_string(),
                }),
            }
        }
        self
    }

    /// Builds the render context for one validated payload.
    pub fn context_for(&self, data: &TeachingDesignData) -> TemplateContext {
        let mut context = TemplateContext::new();

        for binding in &self.scalars {
            let Some(value) = data.scalar(&binding.field) else {
                continue;
            };
            let value = if binding.field == "learning_objectives" {
                format_learning_objectives(value)
            } else {
                value.to_string()
            };
            context.insert_text(binding.placeholder.clone(), value);
        }

        for region in &self.regions {
            let records: Vec<Record> = match region.list.as_str() {
                ACTIVITIES_KEY => data
                    .learning_activities()
                    .iter()
                    .map(|item| project(&region.columns, |key| item.get(key)))
                    .collect(),
                REFLECTIONS_KEY => data
                    .reflection_thinking_points()
                    .iter()
                    .map(|item| project(&region.columns, |key| item.get(key)))
                    .collect(),
                _ => continue,
            };
            context.insert_records(region.placeholder_list.clone(), records);
        }

        context
    }

    /// Compares the table against the placeholders a template declares.
    pub fn check(&self, info: &TemplateInfo) -> BindingCheck {
        let mut check = BindingCheck::default();
        let scalars = info.scalar_placeholders();

        for name in &scalars {
            if *name == LEGACY_ACTIVITY_INTENT {
                check.legacy_activity_intent = true;
                continue;
            }
            if !self.scalars.iter().any(|b| b.placeholder == *name) {
                check.unbound.push(name.to_string());
            }
        }
        for binding in &self.scalars {
            if !scalars.contains(&binding.placeholder.as_str()) {
                check.unused.push(binding.field.clone());
            }
        }

        for region in &info.regions {
            let Some(binding) = self
                .regions
                .iter()
                .find(|b| b.placeholder_list == region.list)
            else {
                check.unbound.push(region.list.clone());
                continue;
            };
            for field in &region.fields {
                if !binding.columns.iter().any(|c| &c.placeholder == field) {
                    check.unbound.push(format!("{}.{}", region.list, field));
                }
            }
        }
        for binding in &self.regions {
            match info.region(&binding.placeholder_list) {
                None => check.unused.push(binding.list.clone()),
                Some(region) => {
                    for column in &binding.columns {
                        if !region.fields.contains(&column.placeholder) {
                            check
                                .unused
                                .push(format!("{}.{}", binding.list, column.field));
                        }
                    }
                }
            }
        }

        check
    }
}

fn project<'a>(columns: &[Binding], get: impl Fn(&str) -> Option<&'a str>) -> Record {
    columns
        .iter()
        .filter_map(|c| get(&c.field).map(|v| (c.placeholder.clone(), v.to_string())))
        .collect()
}

/// Result of checking a binding table against a template.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingCheck {
    /// Placeholders (or `list.field` loop columns) no binding feeds.
    pub unbound: Vec<String>,
    /// Payload fields (or `list.field` columns) the template never shows.
    pub unused: Vec<String>,
    /// The template still carries the retired document-level `{{ activity_intent }}`.
    pub legacy_activity_intent: bool,
}

impl BindingCheck {
    pub fn is_clean(&self) -> bool {
        self.unbound.is_empty() && self.unused.is_empty() && !self.legacy_activity_intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::inspect::{Location, PlaceholderInfo, RegionInfo};

    fn info(scalars: &[&str], fields: &[&str]) -> TemplateInfo {
        TemplateInfo {
            placeholders: scalars
                .iter()
                .enumerate()
                .map(|(i, name)| PlaceholderInfo {
                    name: name.to_string(),
                    part: "word/document.xml".to_string(),
                    location: Location::Paragraph { index: i },
                })
                .collect(),
            regions: vec![RegionInfo {
                list: ACTIVITIES_KEY.to_string(),
                var: "a".to_string(),
                part: "word/document.xml".to_string(),
                table: 1,
                row: 1,
                rows: 1,
                fields: fields.iter().map(|f| f.to_string()).collect(),
            }],
            paragraph_count: scalars.len(),
            table_count: 2,
        }
    }

    #[test]
    fn renamed_placeholder_is_reported_unbound() {
        let table = BindingTable::default();
        let check = table.check(&info(&["lesson_title"], &["name"]));
        assert_eq!(check.unbound, vec!["lesson_title".to_string()]);
        assert!(check.unused.contains(&"lesson_name".to_string()));

        let fixed = table.rename("lesson_name", "lesson_title");
        let check = fixed.check(&info(&["lesson_title"], &["name"]));
        assert!(check.unbound.is_empty());
    }

    #[test]
    fn global_activity_intent_is_flagged() {
        let check = BindingTable::default().check(&info(&["activity_intent"], &[]));
        assert!(check.legacy_activity_intent);
        assert!(!check.unbound.contains(&"activity_intent".to_string()));
    }

    #[test]
    fn renamed_column_must_match_loop_field() {
        let check = BindingTable::default().check(&info(&[], &["intent"]));
        assert!(check.unbound.contains(&"learning_activities.intent".to_string()));

        let table =
            BindingTable::default().rename_column(ACTIVITIES_KEY, "activity_intent", "intent");
        let check = table.check(&info(&[], &["intent"]));
        assert!(check.unbound.is_empty());
    }
}
