//! Named rules and calibrated profiles, kept in one JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use matcher::Rule;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::profile::Profile;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Store {
	#[serde(default)]
	profiles: BTreeMap<String, Profile>,
	#[serde(default)]
	rules: BTreeMap<String, Rule>,
	#[serde(skip)]
	path: PathBuf,
}

impl Store {
	pub fn default_path() -> Result<PathBuf> {
		Ok(crate::config::Config::dir()?.join("store.json"))
	}

	/// Open the store at `path`; a missing file is an empty store.
	pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let mut store: Store = if path.exists() {
			let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
			serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?
		} else {
			Store::default()
		};
		store.path = path;
		Ok(store)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Write the whole document, replacing the old file only once fully written.
	pub fn save(&self) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
		}
		let json = serde_json::to_string_pretty(self).context("serialize store")?;
		let tmp = self.path.with_extension("json.tmp");
		fs::write(&tmp, json).with_context(|| format!("write {:?}", tmp))?;
		fs::rename(&tmp, &self.path).with_context(|| format!("replace {:?}", self.path))?;
		Ok(())
	}

	pub fn profile_names(&self) -> impl Iterator<Item = &str> {
		self.profiles.keys().map(String::as_str)
	}

	pub fn profile(&self, name: &str) -> Result<&Profile, StoreError> {
		self.profiles.get(name).ok_or_else(|| not_found("profile", name))
	}

	/// Insert or overwrite.
	pub fn put_profile(&mut self, name: impl Into<String>, profile: Profile) {
		self.profiles.insert(name.into(), profile);
	}

	pub fn remove_profile(&mut self, name: &str) -> Result<Profile, StoreError> {
		self.profiles.remove(name).ok_or_else(|| not_found("profile", name))
	}

	pub fn rename_profile(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
		rename(&mut self.profiles, "profile", from, to)
	}

	pub fn rule_names(&self) -> impl Iterator<Item = &str> {
		self.rules.keys().map(String::as_str)
	}

	pub fn rule(&self, name: &str) -> Result<&Rule, StoreError> {
		self.rules.get(name).ok_or_else(|| not_found("rule", name))
	}

	pub fn put_rule(&mut self, name: impl Into<String>, rule: Rule) {
		self.rules.insert(name.into(), rule);
	}

	pub fn remove_rule(&mut self, name: &str) -> Result<Rule, StoreError> {
		self.rules.remove(name).ok_or_else(|| not_found("rule", name))
	}

	pub fn rename_rule(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
		rename(&mut self.rules, "rule", from, to)
	}
}

fn not_found(kind: &'static str, name: &str) -> StoreError {
	StoreError::NotFound {
		kind,
		name: name.to_string(),
	}
}

fn rename<T>(map: &mut BTreeMap<String, T>, kind: &'static str, from: &str, to: &str) -> Result<(), StoreError> {
	if from == to {
		return map.contains_key(from).then_some(()).ok_or_else(|| not_found(kind, from));
	}
	if map.contains_key(to) {
		return Err(StoreError::AlreadyExists {
			kind,
			name: to.to_string(),
		});
	}
	let value = map.remove(from).ok_or_else(|| not_found(kind, from))?;
	map.insert(to.to_string(), value);
	Ok(())
}

#[cfg(test)]
mod tests {
	use matcher::{AffixItem, ConditionGroup};

	use super::*;
	use crate::profile::{Point, Region, WindowBinding};

	fn profile() -> Profile {
		Profile {
			hover: Some(Point::new(10, 20)),
			region: Some(Region { x: 1, y: 2, width: 300, height: 120 }),
			reroll: Some(Point::new(500, 600)),
			window: Some(WindowBinding { title: "Game".into() }),
		}
	}

	fn rules() -> Vec<Rule> {
		vec![
			Rule::Keyword("冰霜抗性".into()),
			Rule::Expression("冰霜 && (攻速 || 暴击)".into()),
			Rule::Groups(vec![
				ConditionGroup::all([AffixItem::new("力量").with_min(10.0).with_max(20.0)]),
				ConditionGroup::none_of([AffixItem::new("诅咒").exact()]),
				ConditionGroup::count(["a", "b", "c"].map(AffixItem::from), Some(1), Some(2)),
			]),
		]
	}

	#[test]
	fn round_trips_through_disk() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("store.json");

		let mut store = Store::load(&path).unwrap();
		store.put_profile("helm", profile());
		for (index, rule) in rules().into_iter().enumerate() {
			store.put_rule(format!("rule{index}"), rule);
		}
		store.save().unwrap();
		assert!(!path.with_extension("json.tmp").exists());

		let back = Store::load(&path).unwrap();
		assert_eq!(back.profile("helm").unwrap(), &profile());
		for (index, rule) in rules().iter().enumerate() {
			assert_eq!(back.rule(&format!("rule{index}")).unwrap(), rule);
		}
		assert_eq!(back.rule_names().collect::<Vec<_>>(), ["rule0", "rule1", "rule2"]);
	}

	#[test]
	fn reads_legacy_rule_shapes() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("store.json");
		fs::write(
			&path,
			r#"{"rules": {
				"old": ["冰霜抗性", "攻速"],
				"dict": {"AND": ["a"], "OR": ["b"]},
				"bare": "冰霜 || 火焰"
			}}"#,
		)
		.unwrap();

		let store = Store::load(&path).unwrap();
		assert_eq!(store.rule("bare").unwrap(), &Rule::Expression("冰霜 || 火焰".into()));
		assert!(matches!(store.rule("old").unwrap(), Rule::Groups(groups) if groups.len() == 1));
		assert!(matches!(store.rule("dict").unwrap(), Rule::Groups(groups) if groups.len() == 2));
		assert_eq!(store.profile_names().count(), 0);
	}

	#[test]
	fn rename_and_remove() {
		let mut store = Store::default();
		store.put_rule("a", Rule::Keyword("x".into()));
		store.put_rule("b", Rule::Keyword("y".into()));

		assert_eq!(
			store.rename_rule("a", "b"),
			Err(StoreError::AlreadyExists { kind: "rule", name: "b".into() })
		);
		store.rename_rule("a", "c").unwrap();
		assert_eq!(store.rule("c").unwrap(), &Rule::Keyword("x".into()));
		assert!(store.rule("a").is_err());

		assert_eq!(store.remove_rule("c").unwrap(), Rule::Keyword("x".into()));
		assert_eq!(
			store.remove_profile("nope"),
			Err(StoreError::NotFound { kind: "profile", name: "nope".into() })
		);
		assert!(store.rename_profile("nope", "other").is_err());
	}
}
