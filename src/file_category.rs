//! Category rules for sorting downloads by file extension.
//!
//! This module maps lowercased file extensions (with their leading dot) to a
//! fixed set of categories. Each category corresponds to a same-named
//! subdirectory under the watched directory, so the names returned by
//! [`Category::dir_name`] are user-visible and must stay stable.
//!
//! # Examples
//!
//! ```
//! use downtidy::file_category::{Category, CategoryRuleSet};
//!
//! let rules = CategoryRuleSet::default();
//! assert_eq!(rules.classify_extension(".png"), Some(Category::Images));
//! assert_eq!(rules.classify_extension(".rs"), Some(Category::Code));
//! assert_eq!(rules.classify_extension(".xyz123"), None);
//! assert!(rules.is_partial(".crdownload"));
//! ```
use std::collections::HashSet;
use std::path::Path;

/// A destination category for organized entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Photos, raster and vector images, camera RAW files
    Images,
    /// Video containers (MP4, MKV, MOV, etc.)
    Videos,
    /// Audio files (MP3, FLAC, WAV, etc.)
    Music,
    /// Text, office and publishing documents
    Documents,
    /// Compressed archives
    Archives,
    /// Mountable disk images (DMG, ISO)
    DiskImages,
    /// Installer packages
    Installers,
    /// Application bundles
    Apps,
    /// Font files
    Fonts,
    /// Design tool documents
    Design,
    /// 3D models and scenes
    ThreeD,
    /// Source code and structured data files
    Code,
    /// Torrent descriptors
    Torrents,
    /// Subtitle tracks
    Subtitles,
    /// Certificates and key material
    Certificates,
    /// Virtual machine images
    Vm,
    /// Log files
    Logs,
    /// Catch-all for anything unclassified
    Other,
}

impl Category {
    /// Every category in declaration order, the catch-all last.
    pub const ALL: [Category; 18] = [
        Category::Images,
        Category::Videos,
        Category::Music,
        Category::Documents,
        Category::Archives,
        Category::DiskImages,
        Category::Installers,
        Category::Apps,
        Category::Fonts,
        Category::Design,
        Category::ThreeD,
        Category::Code,
        Category::Torrents,
        Category::Subtitles,
        Category::Certificates,
        Category::Vm,
        Category::Logs,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// Renaming any of these breaks users who already have organized folders.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::ThreeD.dir_name(), "3D");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Music => "Music",
            Category::Documents => "Documents",
            Category::Archives => "Archives",
            Category::DiskImages => "DiskImages",
            Category::Installers => "Installers",
            Category::Apps => "Apps",
            Category::Fonts => "Fonts",
            Category::Design => "Design",
            Category::ThreeD => "3D",
            Category::Code => "Code",
            Category::Torrents => "Torrents",
            Category::Subtitles => "Subtitles",
            Category::Certificates => "Certificates",
            Category::Vm => "VM",
            Category::Logs => "Logs",
            Category::Other => "Other",
        }
    }

    /// Parses a directory name back into its category. Matching is exact.
    pub fn from_dir_name(name: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Suffixes browsers use while a download is still in flight.
const PARTIAL_EXTENSIONS: &[&str] = &[".download", ".crdownload", ".part"];

/// Ordered extension rules plus the partial-download suffix family.
///
/// Rules are consulted in insertion order and the first category whose set
/// contains the extension wins, so an extension listed twice always resolves
/// the same way.
#[derive(Debug, Clone)]
pub struct CategoryRuleSet {
    rules: Vec<(Category, HashSet<String>)>,
    partial_extensions: HashSet<String>,
}

impl CategoryRuleSet {
    /// Creates a rule set with no categories and no partial suffixes.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            partial_extensions: HashSet::new(),
        }
    }

    /// Creates the standard rule set.
    pub fn new() -> Self {
        let mut rules = Self::empty();
        rules.populate_standard_rules();
        for ext in PARTIAL_EXTENSIONS {
            rules.add_partial_extension(ext);
        }
        rules
    }

    fn populate_standard_rules(&mut self) {
        self.add_rule(
            Category::Images,
            &[
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".webp", ".svg",
                ".heic", ".raw", ".cr2", ".nef", ".arw", ".dng",
            ],
        );
        self.add_rule(
            Category::Videos,
            &[
                ".mp4", ".mov", ".avi", ".mkv", ".flv", ".wmv", ".webm", ".m4v", ".mpeg", ".mpg",
            ],
        );
        self.add_rule(
            Category::Music,
            &[".mp3", ".wav", ".aiff", ".aac", ".flac", ".m4a", ".ogg", ".alac"],
        );
        self.add_rule(
            Category::Documents,
            &[
                ".pdf", ".doc", ".docx", ".txt", ".rtf", ".csv", ".tsv", ".ppt", ".pptx", ".key",
                ".xls", ".xlsx", ".numbers", ".pages", ".md", ".tex",
            ],
        );
        self.add_rule(
            Category::Archives,
            &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz"],
        );
        self.add_rule(Category::DiskImages, &[".dmg", ".iso"]);
        self.add_rule(Category::Installers, &[".pkg", ".mpkg"]);
        self.add_rule(Category::Apps, &[".app"]);
        self.add_rule(Category::Fonts, &[".ttf", ".otf", ".woff", ".woff2"]);
        self.add_rule(Category::Design, &[".fig", ".sketch", ".xd", ".psd", ".ai"]);
        self.add_rule(
            Category::ThreeD,
            &[".blend", ".fbx", ".obj", ".stl", ".dae", ".glb", ".gltf"],
        );
        self.add_rule(
            Category::Code,
            &[
                ".py", ".js", ".ts", ".tsx", ".jsx", ".html", ".css", ".scss", ".java", ".kt",
                ".cpp", ".c", ".hpp", ".h", ".cs", ".swift", ".rs", ".go", ".sh", ".zsh", ".bash",
                ".rb", ".php", ".sql", ".json", ".yaml", ".yml", ".toml", ".ipynb", ".xml",
            ],
        );
        self.add_rule(Category::Torrents, &[".torrent"]);
        self.add_rule(Category::Subtitles, &[".srt", ".vtt"]);
        // .key is also a Keynote deck; Documents is declared first and keeps it.
        self.add_rule(
            Category::Certificates,
            &[".pem", ".crt", ".cer", ".key", ".p12"],
        );
        self.add_rule(Category::Vm, &[".ova", ".ovf", ".vdi", ".vmdk"]);
        self.add_rule(Category::Logs, &[".log"]);
    }

    /// Builder form of [`CategoryRuleSet::add_rule`].
    pub fn with_rule(mut self, category: Category, extensions: &[&str]) -> Self {
        self.add_rule(category, extensions);
        self
    }

    /// Adds extensions to a category, appending the category to the lookup
    /// order the first time it is seen.
    pub fn add_rule(&mut self, category: Category, extensions: &[&str]) {
        for ext in extensions {
            self.add_extension(category, ext);
        }
    }

    /// Adds a single extension mapping. A missing leading dot is supplied.
    pub fn add_extension(&mut self, category: Category, ext: &str) {
        let ext = normalize_extension(ext);
        match self.rules.iter_mut().find(|(c, _)| *c == category) {
            Some((_, set)) => {
                set.insert(ext);
            }
            None => self.rules.push((category, HashSet::from([ext]))),
        }
    }

    /// Marks an extension as an in-progress download suffix.
    pub fn add_partial_extension(&mut self, ext: &str) {
        self.partial_extensions.insert(normalize_extension(ext));
    }

    /// Looks up an already-lowercased extension, first match in rule order.
    pub fn classify_extension(&self, ext: &str) -> Option<Category> {
        self.rules
            .iter()
            .find(|(_, exts)| exts.contains(ext))
            .map(|(category, _)| *category)
    }

    /// Returns true if the extension belongs to the partial-download family.
    pub fn is_partial(&self, ext: &str) -> bool {
        self.partial_extensions.contains(ext)
    }

    /// Returns true if the extension maps to [`Category::Code`].
    ///
    /// Uses the same first-match order as [`CategoryRuleSet::classify_extension`].
    pub fn is_code_extension(&self, ext: &str) -> bool {
        self.classify_extension(ext) == Some(Category::Code)
    }

    /// Directory names of every category, including the catch-all.
    pub fn category_dir_names(&self) -> impl Iterator<Item = &'static str> {
        Category::ALL.iter().map(Category::dir_name)
    }

    /// Returns true if `name` is exactly one of the category directory names.
    pub fn is_category_dir_name(&self, name: &str) -> bool {
        Category::from_dir_name(name).is_some()
    }
}

impl Default for CategoryRuleSet {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Returns the lowercased extension of `path` including its leading dot,
/// or an empty string when there is none.
///
/// # Examples
///
/// ```
/// use downtidy::file_category::extension_of;
/// use std::path::Path;
///
/// assert_eq!(extension_of(Path::new("Report.PDF")), ".pdf");
/// assert_eq!(extension_of(Path::new("video.mp4.crdownload")), ".crdownload");
/// assert_eq!(extension_of(Path::new(".bashrc")), "");
/// assert_eq!(extension_of(Path::new("README")), "");
/// ```
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_dir_names() {
        assert_eq!(Category::Images.dir_name(), "Images");
        assert_eq!(Category::Videos.dir_name(), "Videos");
        assert_eq!(Category::Music.dir_name(), "Music");
        assert_eq!(Category::DiskImages.dir_name(), "DiskImages");
        assert_eq!(Category::ThreeD.dir_name(), "3D");
        assert_eq!(Category::Vm.dir_name(), "VM");
        assert_eq!(Category::Other.dir_name(), "Other");
    }

    #[test]
    fn test_dir_names_round_trip_and_are_unique() {
        let names: HashSet<_> = Category::ALL.iter().map(Category::dir_name).collect();
        assert_eq!(names.len(), Category::ALL.len());
        assert_eq!(Category::from_dir_name("Code"), Some(Category::Code));
        assert_eq!(Category::from_dir_name("code"), None);
    }

    #[test]
    fn test_classify_extension() {
        let rules = CategoryRuleSet::default();
        assert_eq!(rules.classify_extension(".pdf"), Some(Category::Documents));
        assert_eq!(rules.classify_extension(".mp3"), Some(Category::Music));
        assert_eq!(rules.classify_extension(".dmg"), Some(Category::DiskImages));
        assert_eq!(rules.classify_extension(".stl"), Some(Category::ThreeD));
        assert_eq!(rules.classify_extension(".xyz123"), None);
        assert_eq!(rules.classify_extension(""), None);
    }

    #[test]
    fn test_duplicate_extension_resolves_to_first_declared_category() {
        let rules = CategoryRuleSet::default();
        assert_eq!(rules.classify_extension(".key"), Some(Category::Documents));

        let custom = CategoryRuleSet::empty()
            .with_rule(Category::Logs, &[".dat"])
            .with_rule(Category::Archives, &[".dat"]);
        assert_eq!(custom.classify_extension(".dat"), Some(Category::Logs));
    }

    #[test]
    fn test_partial_extensions_are_not_categories() {
        let rules = CategoryRuleSet::default();
        for ext in [".download", ".crdownload", ".part"] {
            assert!(rules.is_partial(ext));
            assert_eq!(rules.classify_extension(ext), None);
        }
        assert!(!rules.is_partial(".mp4"));
    }

    #[test]
    fn test_add_extension_normalizes() {
        let mut rules = CategoryRuleSet::empty();
        rules.add_extension(Category::Code, "ZIG");
        assert_eq!(rules.classify_extension(".zig"), Some(Category::Code));
        assert!(rules.is_code_extension(".zig"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("/tmp/Photo.JPG")), ".jpg");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Path::new("noext")), "");
    }

    #[test]
    fn test_category_dir_name_detection() {
        let rules = CategoryRuleSet::default();
        assert!(rules.is_category_dir_name("Images"));
        assert!(rules.is_category_dir_name("Other"));
        assert!(!rules.is_category_dir_name("images"));
        assert_eq!(rules.category_dir_names().count(), Category::ALL.len());
    }
}
