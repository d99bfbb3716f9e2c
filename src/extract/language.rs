//! Extension <-> language table used when a format does not name the
//! language (or the file) explicitly.

/// `(extension, language)` pairs. `yml` is an extension-only alias.
const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("ts", "typescript"),
    ("tsx", "tsx"),
    ("js", "javascript"),
    ("jsx", "jsx"),
    ("py", "python"),
    ("rb", "ruby"),
    ("go", "go"),
    ("rs", "rust"),
    ("java", "java"),
    ("cpp", "cpp"),
    ("c", "c"),
    ("cs", "csharp"),
    ("php", "php"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("scala", "scala"),
    ("sh", "bash"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("json", "json"),
    ("md", "markdown"),
    ("html", "html"),
    ("css", "css"),
    ("scss", "scss"),
    ("sql", "sql"),
];

/// Extension used when a language tag is missing or unknown
pub const GENERIC_EXTENSION: &str = ".txt";

/// Language for a bare extension (no dot), case-insensitive
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_lowercase();
    EXTENSION_LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// Dotted extension for a language tag; unknown tags get [`GENERIC_EXTENSION`]
pub fn extension_for_language(language: Option<&str>) -> String {
    let Some(language) = language else {
        return GENERIC_EXTENSION.to_string();
    };
    let language = language.to_lowercase();

    // First match wins, so yaml maps back to .yaml rather than .yml
    EXTENSION_LANGUAGES
        .iter()
        .find(|(_, lang)| *lang == language)
        .map(|(ext, _)| format!(".{}", ext))
        .unwrap_or_else(|| GENERIC_EXTENSION.to_string())
}

/// Detect a language from the extension of a relative path
pub fn detect_language(path: &str) -> Option<String> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    language_for_extension(ext).map(str::to_string)
}
