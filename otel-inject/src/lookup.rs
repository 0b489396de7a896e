//! Name-keyed lookups over the optional lists of a pod spec.

use k8s_openapi::api::core::v1::{Container, EnvVar, Volume, VolumeMount};

pub(crate) trait Named {
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named!(Container, EnvVar, Volume, VolumeMount);

/// Index of the first entry called `name`.
pub(crate) fn position<T: Named>(items: Option<&Vec<T>>, name: &str) -> Option<usize> {
    items?.iter().position(|item| item.name() == name)
}

pub(crate) fn contains<T: Named>(items: Option<&Vec<T>>, name: &str) -> bool {
    position(items, name).is_some()
}

/// Appends `item` unless an entry with the same name exists.
pub(crate) fn append_if_missing<T: Named>(items: &mut Option<Vec<T>>, item: T) {
    if !contains(items.as_ref(), item.name()) {
        items.get_or_insert_with(Vec::new).push(item);
    }
}

/// Removes the first entry called `name`. The list is reset to `None` once empty, since the API
/// server does not distinguish an empty list from an absent one.
pub(crate) fn remove<T: Named>(items: &mut Option<Vec<T>>, name: &str) -> Option<T> {
    let list = items.as_mut()?;
    let idx = list.iter().position(|item| item.name() == name)?;
    let removed = list.remove(idx);
    if list.is_empty() {
        *items = None;
    }
    Some(removed)
}

/// Sets the value of the variable `name`, appending it if absent.
pub(crate) fn upsert_env(env: &mut Option<Vec<EnvVar>>, name: &str, value: String) {
    let vars = env.get_or_insert_with(Vec::new);
    match vars.iter_mut().find(|var| var.name == name) {
        Some(var) => var.value = Some(value),
        None => vars.push(EnvVar {
            name: name.to_string(),
            value: Some(value),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
pub(crate) fn env_value<'a>(env: Option<&'a Vec<EnvVar>>, name: &str) -> Option<&'a str> {
    env?.iter()
        .find(|var| var.name == name)
        .map(|var| var.value.as_deref().unwrap_or_default())
}
