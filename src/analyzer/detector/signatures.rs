//! Framework signature table
//!
//! Each signature lists the files, folders and manifest entries that count as
//! evidence for one project type. On equal final score the lower `rank` wins,
//! so more specific stacks (`next`, `nuxt`) rank ahead of the generic ones
//! they build on (`react`, `vue`).

use crate::types::ProjectType;

/// Weighted evidence pattern for one project type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameworkSignature {
    pub project_type: ProjectType,
    /// Tie-break order, lower wins
    pub rank: u16,
    pub file_indicators: &'static [&'static str],
    pub folder_indicators: &'static [&'static str],
    /// First entry is the primary dependency used for version extraction
    pub dependencies: &'static [&'static str],
    pub dev_dependencies: &'static [&'static str],
    pub scripts: &'static [&'static str],
    /// Multiplier in (0, 1] applied to the raw score
    pub base_confidence: f32,
    /// Added after scaling
    pub priority: f32,
    /// When non-empty, at least one of these must be present as a file or as
    /// an exactly named (dev)dependency, otherwise the signature is skipped.
    /// Keeps `next`/`nuxt` from claiming plain React/Vue apps through the
    /// dependencies they share.
    pub anchors: &'static [&'static str],
}

impl FrameworkSignature {
    /// Whether any manifest entry can contribute to this signature
    pub fn uses_manifest(&self) -> bool {
        !self.dependencies.is_empty() || !self.dev_dependencies.is_empty() || !self.scripts.is_empty()
    }

    pub fn primary_dependency(&self) -> Option<&'static str> {
        self.dependencies.first().copied()
    }
}

/// Built-in signatures, authored in rank order
pub const SIGNATURES: &[FrameworkSignature] = &[
    FrameworkSignature {
        project_type: ProjectType::Next,
        rank: 0,
        file_indicators: &["next.config.js", "next.config.mjs", "next.config.ts"],
        folder_indicators: &["src", "public", "pages", ".next"],
        dependencies: &["next", "react", "react-dom"],
        dev_dependencies: &[],
        scripts: &[],
        base_confidence: 0.8,
        priority: 8.0,
        anchors: &["next.config.js", "next.config.mjs", "next.config.ts", "next"],
    },
    FrameworkSignature {
        project_type: ProjectType::React,
        rank: 1,
        file_indicators: &[],
        folder_indicators: &["src", "public"],
        dependencies: &["react", "react-dom"],
        dev_dependencies: &["react-scripts", "@vitejs/plugin-react"],
        scripts: &["start", "build", "test"],
        base_confidence: 0.9,
        priority: 5.0,
        anchors: &[],
    },
    FrameworkSignature {
        project_type: ProjectType::Nuxt,
        rank: 2,
        file_indicators: &["nuxt.config.js", "nuxt.config.ts"],
        folder_indicators: &["pages", "components", ".nuxt"],
        dependencies: &["nuxt", "vue"],
        dev_dependencies: &[],
        scripts: &[],
        base_confidence: 0.8,
        priority: 8.0,
        anchors: &["nuxt.config.js", "nuxt.config.ts", "nuxt"],
    },
    FrameworkSignature {
        project_type: ProjectType::Vue,
        rank: 3,
        file_indicators: &["vue.config.js"],
        folder_indicators: &["src", "public"],
        dependencies: &["vue"],
        dev_dependencies: &["@vue/cli-service", "@vitejs/plugin-vue"],
        scripts: &["serve"],
        base_confidence: 0.9,
        priority: 5.0,
        anchors: &[],
    },
    FrameworkSignature {
        project_type: ProjectType::Svelte,
        rank: 4,
        file_indicators: &["svelte.config.js"],
        folder_indicators: &["src"],
        dependencies: &["svelte", "@sveltejs/kit"],
        dev_dependencies: &["@sveltejs/vite-plugin-svelte"],
        scripts: &[],
        base_confidence: 0.9,
        priority: 5.0,
        anchors: &[],
    },
    FrameworkSignature {
        project_type: ProjectType::Angular,
        rank: 5,
        file_indicators: &["angular.json"],
        folder_indicators: &["src"],
        dependencies: &["@angular/core"],
        dev_dependencies: &["@angular/cli"],
        scripts: &["ng"],
        base_confidence: 0.95,
        priority: 5.0,
        anchors: &[],
    },
    FrameworkSignature {
        project_type: ProjectType::Deno,
        rank: 6,
        file_indicators: &["deno.json", "deno.jsonc"],
        folder_indicators: &[],
        dependencies: &[],
        dev_dependencies: &[],
        scripts: &[],
        base_confidence: 1.0,
        priority: 3.0,
        anchors: &[],
    },
    FrameworkSignature {
        project_type: ProjectType::Wordpress,
        rank: 7,
        file_indicators: &["wp-config.php", "wp-load.php"],
        folder_indicators: &["wp-content", "wp-admin", "wp-includes"],
        dependencies: &[],
        dev_dependencies: &[],
        scripts: &[],
        base_confidence: 1.0,
        priority: 4.0,
        anchors: &[],
    },
    FrameworkSignature {
        project_type: ProjectType::Node,
        rank: 8,
        file_indicators: &["package.json"],
        folder_indicators: &["node_modules"],
        dependencies: &["express", "fastify", "koa", "@nestjs/core"],
        dev_dependencies: &["nodemon", "ts-node"],
        scripts: &["start"],
        base_confidence: 0.5,
        priority: 1.0,
        anchors: &[],
    },
    FrameworkSignature {
        project_type: ProjectType::Static,
        rank: 9,
        file_indicators: &["index.html"],
        folder_indicators: &["css", "js", "assets", "images"],
        dependencies: &[],
        dev_dependencies: &[],
        scripts: &[],
        base_confidence: 0.6,
        priority: 0.0,
        anchors: &[],
    },
];
