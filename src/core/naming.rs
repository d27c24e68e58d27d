//! Display-name formatting and collision-free material naming.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static BEFORE_CAPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\B([A-Z])").expect("static regex"));
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("static regex"));
static WORD_THEN_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\D)(\d)").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Options for [`NameFormat::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameFormat
{
    /// When false, formatting is the identity
    pub enabled: bool,
    /// Every character in this string becomes a space
    pub replace_by_space: String,
    pub add_space_by_caps: bool,
    pub add_space_between_word_and_number: bool,
}

impl Default for NameFormat
{
    fn default() -> Self
    {
        Self {
            enabled: true,
            replace_by_space: "_".to_string(),
            add_space_by_caps: true,
            add_space_between_word_and_number: true,
        }
    }
}

impl NameFormat
{
    /// Identity formatter.
    pub fn disabled() -> Self
    {
        Self { enabled: false, ..Self::default() }
    }

    /// Format a folder or material name: `Dark_OakWood2` -> `Dark Oak Wood 2`.
    pub fn apply(
        &self,
        text: &str,
    ) -> String
    {
        if !self.enabled
        {
            return text.to_string();
        }

        let mut name: String = text
            .chars()
            .map(|c| {
                if self
                    .replace_by_space
                    .contains(c)
                {
                    ' '
                }
                else
                {
                    c
                }
            })
            .collect();

        if self.add_space_by_caps
        {
            name = BEFORE_CAPS
                .replace_all(&name, " $1")
                .into_owned();
        }

        if self.add_space_between_word_and_number
        {
            name = DIGIT_RUN
                .replace_all(&name, " $1")
                .into_owned();
            name = WORD_THEN_DIGIT
                .replace_all(&name, "$1 $2")
                .into_owned();
        }

        WHITESPACE
            .replace_all(&name, " ")
            .trim()
            .to_string()
    }
}

/// Tracks taken material names and hands out unique ones.
#[derive(Debug, Default, Clone)]
pub struct MaterialNamespace
{
    taken: HashSet<String>,
}

impl MaterialNamespace
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Seed with names that already exist in the host library.
    pub fn with_existing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: names
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool
    {
        self.taken.contains(name)
    }

    /// Reserve `base`, or `base.001`, `base.002`, ... if it is taken.
    pub fn claim(
        &mut self,
        base: &str,
    ) -> String
    {
        let mut candidate = base.to_string();
        let mut n = 1u32;
        while self
            .taken
            .contains(&candidate)
        {
            candidate = format!("{base}.{n:03}");
            n += 1;
        }
        self.taken
            .insert(candidate.clone());
        candidate
    }
}
