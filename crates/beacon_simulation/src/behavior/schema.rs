//! Декларативная схема полей behavior (для editor tooling / inspector)
//!
//! Строится один раз при инициализации типа: группы, имена, типы,
//! get/set accessors. Значения передаются строками (console convention).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ReplicationError, ReplicationResult};

/// Тип значения поля
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    F32,
    Bool,
    /// "x y z"
    Point3F,
}

/// Поле behavior типа `T`
pub struct FieldDescriptor<T> {
    pub name: &'static str,
    pub group: Option<&'static str>,
    pub kind: FieldKind,
    pub get: fn(&T) -> String,
    /// None — значение не распарсилось
    pub set: fn(&mut T, &str) -> Option<()>,
}

/// Публичное описание поля без accessors (для dyn BehaviorInstance)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub group: Option<&'static str>,
    pub kind: FieldKind,
}

pub struct FieldSchema<T> {
    fields: Vec<FieldDescriptor<T>>,
    current_group: Option<&'static str>,
}

impl<T> Default for FieldSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FieldSchema<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            current_group: None,
        }
    }

    pub fn add_group(&mut self, name: &'static str) {
        self.current_group = Some(name);
    }

    pub fn end_group(&mut self, name: &'static str) {
        debug_assert_eq!(self.current_group, Some(name), "end_group without matching add_group");
        self.current_group = None;
    }

    pub fn add_field(
        &mut self,
        name: &'static str,
        kind: FieldKind,
        get: fn(&T) -> String,
        set: fn(&mut T, &str) -> Option<()>,
    ) {
        self.fields.push(FieldDescriptor {
            name,
            group: self.current_group,
            kind,
            get,
            set,
        });
    }

    /// Добавить поля другой схемы в конец (parent fields)
    pub fn append(&mut self, other: FieldSchema<T>) {
        self.fields.extend(other.fields);
    }

    pub fn remove_field(&mut self, name: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|field| field.name != name);
        self.fields.len() != before
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn infos(&self) -> Vec<FieldInfo> {
        self.fields
            .iter()
            .map(|field| FieldInfo {
                name: field.name,
                group: field.group,
                kind: field.kind,
            })
            .collect()
    }

    pub fn get(&self, target: &T, name: &str) -> ReplicationResult<String> {
        let field = self
            .field(name)
            .ok_or_else(|| ReplicationError::UnknownField(name.to_string()))?;
        Ok((field.get)(target))
    }

    pub fn set(&self, target: &mut T, name: &str, value: &str) -> ReplicationResult<()> {
        let field = self
            .field(name)
            .ok_or_else(|| ReplicationError::UnknownField(name.to_string()))?;

        (field.set)(target, value).ok_or_else(|| ReplicationError::InvalidFieldValue {
            field: name.to_string(),
            value: value.to_string(),
        })
    }
}

pub fn parse_f32(value: &str) -> Option<f32> {
    value.trim().parse().ok()
}

pub fn format_f32(value: f32) -> String {
    value.to_string()
}

/// "1"/"0"/"true"/"false" (регистр не важен)
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

pub fn format_bool(value: bool) -> String {
    let text = if value { "1" } else { "0" };
    text.to_string()
}

pub fn parse_point3f(value: &str) -> Option<Vec3> {
    let mut parts = value.split_whitespace().map(parse_f32);
    let x = parts.next()??;
    let y = parts.next()??;
    let z = parts.next()??;
    if parts.next().is_some() {
        return None;
    }
    Some(Vec3::new(x, y, z))
}

pub fn format_point3f(value: Vec3) -> String {
    format!("{} {} {}", value.x, value.y, value.z)
}
