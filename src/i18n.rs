// i18n.rs: runtime UI strings
//
// - Strings come from assets/i18n/<lang>.json next to the executable or in
//   the working directory, else from the copies built into the binary.
// - Lookup order: selected language, then English, then the key itself.
// - `tr("key")` / `tr_with("key", &[("name", ..)])` with {name} placeholders.
//
// Language selection: `--lang <code>`, then PANORAMA_LANG, then "en".

use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";

/// Languages offered in the menu, with their own names.
pub const LANGUAGES: [(&str, &str); 2] = [("en", "English"), ("zh-Hans", "简体中文")];

const BUILTIN: [(&str, &str); 2] = [
    ("en", include_str!("../assets/i18n/en.json")),
    ("zh-Hans", include_str!("../assets/i18n/zh-Hans.json")),
];

#[derive(Debug, Clone)]
pub struct I18n {
    lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn parse_map(text: &str) -> Option<HashMap<String, String>> {
    match serde_json::from_str(text) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("ignoring malformed string table: {e}");
            None
        }
    }
}

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    parse_map(&text)
}

/// 1) <exe_dir>/assets/i18n/<lang>.json
/// 2) ./assets/i18n/<lang>.json
fn find_lang_file(lang: &str) -> Option<PathBuf> {
    let rel = Path::new("assets").join("i18n").join(format!("{lang}.json"));
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&rel)));
    beside_exe.into_iter().chain([rel]).find(|p| p.exists())
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    if let Some(map) = find_lang_file(lang).and_then(|p| load_json_map(&p)) {
        return map;
    }
    BUILTIN
        .iter()
        .find(|(code, _)| *code == lang)
        .and_then(|(_, text)| parse_map(text))
        .unwrap_or_default()
}

/// Initialize or switch the global language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let map = load_lang(&lang);
    if map.is_empty() {
        log::warn!("no strings for language {lang}, using {FALLBACK_LANG}");
    }
    let fallback_map = if lang == FALLBACK_LANG {
        map.clone()
    } else {
        load_lang(FALLBACK_LANG)
    };
    let i = I18n {
        lang,
        map,
        fallback_map,
    };

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else {
        let _ = I18N.set(RwLock::new(i));
    }
}

fn get_locked() -> Option<std::sync::RwLockReadGuard<'static, I18n>> {
    I18N.get().and_then(|l| l.read().ok())
}

/// Language last passed to [`init`], or the fallback before any call.
pub fn current_lang() -> String {
    get_locked()
        .map(|i| i.lang.clone())
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

/// Localized text for `key`, or the key itself when missing.
pub fn tr(key: &str) -> String {
    let Some(i) = get_locked() else {
        return key.to_string();
    };
    i.map
        .get(key)
        .or_else(|| i.fallback_map.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Placeholders without a matching argument are kept as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        s = s.replace(&format!("{{{k}}}"), v);
    }
    s
}

pub fn resolve_lang(cli: Option<&str>) -> String {
    if let Some(lang) = cli {
        return lang.to_string();
    }
    match std::env::var("PANORAMA_LANG") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => FALLBACK_LANG.to_string(),
    }
}
