use super::model::Project;

/// Project types accepted by the search facets.
pub const PROJECT_TYPES: [&str; 3] = ["mod", "resourcepack", "shader"];

/// Hosts paths that carry a project slug, e.g. `modrinth.com/mod/sodium`.
const SLUG_PATHS: [&str; 6] = [
    "mod",
    "plugin",
    "datapack",
    "shader",
    "shaderpack",
    "resourcepack",
];

/// Query for `GET search`.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: String,
    /// Any of `PROJECT_TYPES`; empty searches all.
    pub project_types: Vec<String>,
    pub game_version: Option<String>,
    pub limit: u32,
}

impl SearchParams {
    /// Encode as query pairs. Each facet is its own array so they AND together.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if !self.query.is_empty() {
            pairs.push(("query", self.query.clone()));
        }

        let mut facets = Vec::new();
        if !self.project_types.is_empty() {
            // One array for all types: OR within it.
            let types: Vec<String> = self
                .project_types
                .iter()
                .map(|t| format!("\"project_type:{t}\""))
                .collect();
            facets.push(format!("[{}]", types.join(",")));
        }
        if let Some(version) = self.game_version.as_deref().filter(|v| !v.is_empty()) {
            facets.push(format!("[\"versions:{version}\"]"));
        }
        if !facets.is_empty() {
            pairs.push(("facets", format!("[{}]", facets.join(","))));
        }

        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        pairs
    }
}

/// Extract the project slug from a registry URL; bare slugs pass through.
pub fn parse_slug(input: &str) -> String {
    let input = input.trim();
    if !input.contains('/') {
        return input.to_string();
    }

    let Some(idx) = input.find("modrinth.com/") else {
        return input.to_string();
    };
    let mut parts = input[idx + "modrinth.com/".len()..].split('/');
    match (parts.next(), parts.next()) {
        (Some(kind), Some(rest)) if SLUG_PATHS.contains(&kind) => {
            let slug = rest.split(['?', '#']).next().unwrap_or_default();
            if slug.is_empty() {
                input.to_string()
            } else {
                slug.to_string()
            }
        }
        _ => input.to_string(),
    }
}

/// Search hits split by project type.
#[derive(Debug, Default)]
pub struct SearchGroups {
    pub mods: Vec<Project>,
    pub resourcepacks: Vec<Project>,
    pub shaders: Vec<Project>,
}

impl SearchGroups {
    /// Mods are kept only when they list both `loader` and `game_version`;
    /// packs and shaders are loader-agnostic.
    pub fn group(hits: Vec<Project>, game_version: &str, loader: &str) -> Self {
        let mut groups = Self::default();
        for hit in hits {
            match hit.project_type.as_str() {
                "mod" => {
                    if hit.categories.iter().any(|c| c == loader)
                        && hit.versions.iter().any(|v| v == game_version)
                    {
                        groups.mods.push(hit);
                    }
                }
                "resourcepack" => groups.resourcepacks.push(hit),
                "shader" => groups.shaders.push(hit),
                _ => {}
            }
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty() && self.resourcepacks.is_empty() && self.shaders.is_empty()
    }
}
