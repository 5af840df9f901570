//! Submitted hackathon project.

use hackpsu_core::types::Uid;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::entity::Entity;
use crate::error::DbError;
use crate::Record;

/// A row from `PROJECTS`. The store keeps `team` and `categories` as
/// comma-joined strings; the model holds them as lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Project {
    #[serde(default)]
    pub uid: Option<Uid>,
    #[validate(length(min = 1))]
    pub project_name: String,
    #[serde(default, deserialize_with = "string_list")]
    #[validate(length(min = 1))]
    pub team: Vec<String>,
    #[serde(default, deserialize_with = "int_list")]
    #[validate(custom(function = "non_empty_categories"))]
    pub categories: Vec<i64>,
    #[serde(default)]
    pub hackathon: Option<Uid>,
    #[serde(default)]
    pub table_number: Option<i64>,
}

impl Entity for Project {
    const EXCLUDED: &'static [&'static str] = &["table_number"];

    fn db_representation(&self) -> Result<Record, DbError> {
        let mut record = Record::new();
        if let Some(uid) = &self.uid {
            record.insert("uid".into(), Value::from(uid.clone()));
        }
        record.insert("project_name".into(), Value::from(self.project_name.clone()));
        record.insert("team".into(), Value::from(self.team.join(",")));
        record.insert("categories".into(), Value::from(join_ids(&self.categories)));
        if let Some(hackathon) = &self.hackathon {
            record.insert("hackathon".into(), Value::from(hackathon.clone()));
        }
        Ok(record)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectApiModel {
    pub project_id: Option<Uid>,
    pub project_name: String,
    pub team: Vec<String>,
    pub categories: Vec<i64>,
}

impl From<ProjectApiModel> for Project {
    fn from(api: ProjectApiModel) -> Self {
        Self {
            uid: api.project_id,
            project_name: api.project_name,
            team: api.team,
            categories: api.categories,
            hackathon: None,
            table_number: None,
        }
    }
}

pub(crate) fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
}

fn non_empty_categories(categories: &[i64]) -> Result<(), ValidationError> {
    if categories.is_empty() {
        let mut err = ValidationError::new("minItems");
        err.message = Some("should NOT have fewer than 1 items".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrJoined<T> {
    List(Vec<T>),
    Joined(String),
}

fn split(joined: &str) -> impl Iterator<Item = &str> {
    joined.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<ListOrJoined<String>>::deserialize(deserializer)? {
        Some(ListOrJoined::List(list)) => list,
        Some(ListOrJoined::Joined(joined)) => split(&joined).map(str::to_string).collect(),
        None => Vec::new(),
    })
}

fn int_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
    Ok(match Option::<ListOrJoined<i64>>::deserialize(deserializer)? {
        Some(ListOrJoined::List(list)) => list,
        Some(ListOrJoined::Joined(joined)) => split(&joined)
            .map(|part| part.parse().map_err(serde::de::Error::custom))
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    })
}
