/// A kind of check applied to a file.
///
/// The declaration order is the order in which categories are reported in
/// run summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    ManifestSyntax,
    ManifestStyle,
    TemplateSyntax,
    DataSyntax,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::ManifestSyntax,
        Category::ManifestStyle,
        Category::TemplateSyntax,
        Category::DataSyntax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::ManifestSyntax => "manifest-syntax",
            Category::ManifestStyle => "manifest-style",
            Category::TemplateSyntax => "template-syntax",
            Category::DataSyntax => "data-syntax",
        }
    }

    /// Human-readable description used in run summaries.
    pub fn description(&self) -> &'static str {
        match self {
            Category::ManifestSyntax => "Puppet manifest syntax",
            Category::ManifestStyle => "Puppet manifest style",
            Category::TemplateSyntax => "ERB template syntax",
            Category::DataSyntax => "YAML data syntax",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
