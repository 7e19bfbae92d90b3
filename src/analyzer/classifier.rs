//! Folder-name classifier
//!
//! Decides from a folder name alone whether it looks like a domain
//! (`example.com`), a subdomain-service label (`api`, `blog`, `en`) or an
//! ordinary project folder (`portfolio`, `my-app`). Pure table lookups, no I/O.
//!
//! Ambiguous names always resolve toward *not* creating a project: unknown
//! labels are never subdomains, and exclusions beat every other table.

use std::collections::HashSet;
use std::sync::LazyLock;

use glob::Pattern;

use crate::config::ClassifierConfig;

/// Recognized top-level domains (generic, country-code and newer gTLDs)
pub const DEFAULT_TLDS: &[&str] = &[
    // generic
    "com", "org", "net", "edu", "gov", "mil", "int", "info", "biz", "name", "pro",
    // country-code
    "ac", "ae", "ar", "at", "au", "be", "bg", "br", "by", "ca", "cc", "ch", "cl", "cn", "co",
    "cz", "de", "dk", "ee", "es", "eu", "fi", "fm", "fr", "gg", "gr", "hk", "hr", "hu", "id",
    "ie", "il", "in", "io", "is", "it", "jp", "kr", "la", "li", "lt", "lu", "lv", "me", "mx",
    "my", "nl", "no", "nz", "pe", "ph", "pl", "pt", "ro", "rs", "ru", "se", "sg", "si", "sk",
    "sh", "th", "tk", "to", "tr", "tv", "tw", "ua", "uk", "us", "uy", "vc", "vn", "ws", "za",
    // newer gTLDs
    "ai", "app", "art", "blog", "cloud", "club", "codes", "design", "dev", "digital", "email",
    "fun", "games", "guru", "host", "live", "ltd", "media", "network", "news", "online",
    "page", "photo", "photography", "rocks", "run", "shop", "site", "software", "space",
    "store", "studio", "tech", "today", "tools", "video", "website", "wiki", "work", "world",
    "xyz", "zone",
];

/// Service / region labels accepted as subdomains
pub const DEFAULT_SUBDOMAIN_PATTERNS: &[&str] = &[
    // services
    "api", "www", "blog", "cdn", "app", "admin", "dashboard", "docs", "shop", "store", "mail",
    "dev", "staging", "beta", "static", "assets", "m", "mobile", "portal", "status", "help",
    "support", "auth", "login", "account", "media", "files", "forum", "wiki", "news",
    // country / language codes
    "en", "de", "fr", "es", "it", "nl", "pt", "ru", "ja", "zh", "ko", "us", "uk", "ca", "au",
    "br", "mx",
    // brand-specific
    "studio", "labs", "play", "go",
];

/// Folder names that only ever occur inside a project
pub const DEFAULT_EXCLUDED_FOLDERS: &[&str] = &[
    "src", "dist", "build", "out", "node_modules", "tests", "test", "__tests__", "spec",
    "coverage", "public", "static", "assets", "components", "pages", "lib", "scripts",
    "styles", "css", "js", "images", "img", "fonts", "vendor", "config", "utils", "hooks",
    "types", "bin", "tmp", ".git", ".next", ".nuxt", ".svelte-kit", ".vscode", ".idea",
];

/// Substrings (or `-` suffixed prefixes) marking a folder as a project root
pub const DEFAULT_PROJECT_PATTERNS: &[&str] = &[
    "portfolio", "api", "app", "react", "vue", "angular", "svelte", "next", "nuxt", "website",
    "site", "dashboard", "blog", "shop", "store", "landing", "my-", "client-", "project-",
    "demo", "test-", "tool", "bot", "cli", "game", "clone",
];

static DEFAULT_CLASSIFIER: LazyLock<NameClassifier> = LazyLock::new(NameClassifier::default);

/// See [`NameClassifier::is_domain_like`]
pub fn is_domain_like(name: &str) -> bool {
    DEFAULT_CLASSIFIER.is_domain_like(name)
}

/// See [`NameClassifier::is_subdomain_like`]
pub fn is_subdomain_like(name: &str) -> bool {
    DEFAULT_CLASSIFIER.is_subdomain_like(name)
}

/// See [`NameClassifier::looks_like_project_folder`]
pub fn looks_like_project_folder(name: &str) -> bool {
    DEFAULT_CLASSIFIER.looks_like_project_folder(name)
}

#[derive(Debug, Clone)]
enum ProjectPattern {
    Contains(String),
    Prefix(String),
    Glob(Pattern),
}

impl ProjectPattern {
    fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if lower.contains(['*', '?', '[']) {
            return match Pattern::new(&lower) {
                Ok(p) => Some(Self::Glob(p)),
                Err(e) => {
                    tracing::warn!("Ignoring invalid project pattern '{}': {}", raw, e);
                    None
                }
            };
        }
        if lower.ends_with('-') {
            Some(Self::Prefix(lower))
        } else {
            Some(Self::Contains(lower))
        }
    }

    fn matches(&self, lower_name: &str) -> bool {
        match self {
            Self::Contains(p) => lower_name.contains(p.as_str()),
            Self::Prefix(p) => lower_name.starts_with(p.as_str()),
            Self::Glob(p) => p.matches(lower_name),
        }
    }
}

/// Table-driven folder-name classifier
#[derive(Debug, Clone)]
pub struct NameClassifier {
    tlds: HashSet<String>,
    subdomain_patterns: HashSet<String>,
    excluded_folders: HashSet<String>,
    project_patterns: Vec<ProjectPattern>,
}

impl Default for NameClassifier {
    fn default() -> Self {
        Self::from_tables(
            DEFAULT_TLDS.iter().copied(),
            DEFAULT_SUBDOMAIN_PATTERNS.iter().copied(),
            DEFAULT_EXCLUDED_FOLDERS.iter().copied(),
            DEFAULT_PROJECT_PATTERNS.iter().copied(),
        )
    }
}

impl NameClassifier {
    /// Build from explicit tables. Every entry is lower-cased.
    pub fn from_tables<'a>(
        tlds: impl IntoIterator<Item = &'a str>,
        subdomain_patterns: impl IntoIterator<Item = &'a str>,
        excluded_folders: impl IntoIterator<Item = &'a str>,
        project_patterns: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            tlds: lower_set(tlds.into_iter().map(|t| t.trim_start_matches('.'))),
            subdomain_patterns: lower_set(subdomain_patterns),
            excluded_folders: lower_set(excluded_folders),
            project_patterns: project_patterns
                .into_iter()
                .filter_map(ProjectPattern::parse)
                .collect(),
        }
    }

    /// Built-in tables extended with the configured extras
    pub fn with_overrides(extra: &ClassifierConfig) -> Self {
        if extra.is_empty() {
            return Self::default();
        }
        Self::from_tables(
            DEFAULT_TLDS
                .iter()
                .copied()
                .chain(extra.extra_tlds.iter().map(String::as_str)),
            DEFAULT_SUBDOMAIN_PATTERNS
                .iter()
                .copied()
                .chain(extra.extra_subdomain_patterns.iter().map(String::as_str)),
            DEFAULT_EXCLUDED_FOLDERS
                .iter()
                .copied()
                .chain(extra.extra_excluded_folders.iter().map(String::as_str)),
            DEFAULT_PROJECT_PATTERNS
                .iter()
                .copied()
                .chain(extra.extra_project_patterns.iter().map(String::as_str)),
        )
    }

    /// True iff `name` has a dot and its last label is a recognized TLD
    pub fn is_domain_like(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, tld)) if !tld.is_empty() => self.tlds.contains(&tld.to_lowercase()),
            _ => false,
        }
    }

    /// Exclusion set first, then dotted names as domains, then the pattern set
    pub fn is_subdomain_like(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if self.excluded_folders.contains(&lower) {
            return false;
        }
        if lower.contains('.') {
            return self.is_domain_like(name);
        }
        self.subdomain_patterns.contains(&lower)
    }

    pub fn looks_like_project_folder(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.project_patterns.iter().any(|p| p.matches(&lower))
    }
}

fn lower_set<'a>(items: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_domain_like_examples() {
        assert!(is_domain_like("x.com"));
        assert!(is_domain_like("sub.app"));
        assert!(is_domain_like("thing.io"));
        assert!(is_domain_like("Example.COM"));
        assert!(is_domain_like("blog.example.co.uk"));
        assert!(!is_domain_like("widget.xyz123"));
        assert!(!is_domain_like("widget"));
        assert!(!is_domain_like("trailing."));
    }

    #[test]
    fn test_subdomain_like_examples() {
        assert!(is_subdomain_like("api"));
        assert!(is_subdomain_like("API"));
        assert!(is_subdomain_like("en"));
        assert!(!is_subdomain_like("article"));
        assert!(is_subdomain_like("blog.example.com"));
        assert!(!is_subdomain_like("notes.txt123"));
    }

    #[test]
    fn test_exclusion_beats_subdomain_patterns() {
        // "static" and "assets" are also service labels
        assert!(!is_subdomain_like("static"));
        assert!(!is_subdomain_like("assets"));
        assert!(!is_subdomain_like("src"));
        assert!(!is_subdomain_like("node_modules"));
    }

    #[test]
    fn test_looks_like_project_folder() {
        assert!(looks_like_project_folder("my-portfolio"));
        assert!(looks_like_project_folder("React-Playground"));
        assert!(looks_like_project_folder("client-acme"));
        assert!(looks_like_project_folder("weather-bot"));
        // prefix patterns only match at the start
        assert!(!looks_like_project_folder("army-"));
        assert!(!looks_like_project_folder("sandbox"));
        assert!(!looks_like_project_folder("archive"));
    }

    #[test]
    fn test_with_overrides_extends_tables() {
        let extra = ClassifierConfig {
            extra_tlds: vec![".local".to_string()],
            extra_subdomain_patterns: vec!["Intranet".to_string()],
            extra_excluded_folders: vec!["api".to_string()],
            extra_project_patterns: vec!["*-lab".to_string()],
        };
        let classifier = NameClassifier::with_overrides(&extra);

        assert!(classifier.is_domain_like("home.local"));
        assert!(!is_domain_like("home.local"));
        assert!(classifier.is_subdomain_like("intranet"));
        assert!(!classifier.is_subdomain_like("api"));
        assert!(classifier.looks_like_project_folder("rust-lab"));
        assert!(!is_subdomain_like("intranet"));
    }

    #[test]
    fn test_invalid_glob_is_ignored() {
        let classifier = NameClassifier::from_tables([], [], [], ["[unclosed"]);
        assert!(!classifier.looks_like_project_folder("[unclosed"));
    }

    proptest! {
        #[test]
        fn prop_known_tld_is_domain_like(
            label in "[a-z0-9][a-z0-9-]{0,20}",
            idx in 0usize..DEFAULT_TLDS.len(),
        ) {
            let name = format!("{}.{}", label, DEFAULT_TLDS[idx]);
            prop_assert!(is_domain_like(&name));
            prop_assert!(is_domain_like(&name.to_uppercase()));
        }

        #[test]
        fn prop_undotted_is_never_domain_like(name in "[a-zA-Z0-9_-]{1,30}") {
            prop_assert!(!is_domain_like(&name));
        }

        #[test]
        fn prop_numeric_suffix_is_not_domain_like(
            label in "[a-z]{1,10}",
            suffix in "[a-z]{1,5}[0-9]{1,4}",
        ) {
            let name = format!("{}.{}", label, suffix);
            prop_assert!(!is_domain_like(&name));
        }

        #[test]
        fn prop_excluded_folder_never_subdomain(idx in 0usize..DEFAULT_EXCLUDED_FOLDERS.len()) {
            let name = DEFAULT_EXCLUDED_FOLDERS[idx];
            prop_assert!(!is_subdomain_like(name));
            prop_assert!(!is_subdomain_like(&name.to_uppercase()));
        }

        #[test]
        fn prop_unknown_label_not_subdomain(name in "zz[a-z]{3,12}") {
            prop_assert!(!is_subdomain_like(&name));
        }
    }
}
