//! 알려진 시크릿 키 카탈로그
//!
//! 어떤 논리 키가 존재하는지, 그중 노출 플래그 없이 읽을 수 있는(URL 류) 키가
//! 무엇인지 정의합니다. 생성 후 변경되지 않으며 `Arc`로 주입해 공유합니다.

use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::sync::Arc;

/// 기본 프로바이더 키 목록
const BUILTIN_KEYS: &[&str] = &[
    "api_key_openai",
    "api_key_claude",
    "api_key_mistralai",
    "api_key_openrouter",
    "api_key_groq",
    "api_key_deepseek",
    "api_key_makersuite",
    "api_key_vertexai",
    "api_key_cohere",
    "api_key_perplexity",
    "api_key_ai21",
    "api_key_xai",
    "api_key_togetherai",
    "api_key_fireworks",
    "api_key_nanogpt",
    "api_key_novel",
    "api_key_horde",
    "api_key_dreamgen",
    "api_key_infermaticai",
    "api_key_featherless",
    "api_key_huggingface",
    "api_key_stability",
    "api_key_serpapi",
    "api_key_elevenlabs",
    "api_key_deepl",
    "api_key_libre",
    "api_url_scale",
    "sd_auto_auth",
    "sd_comfy_auth",
    "libre_url",
    "lingva_url",
    "oneringtranslator_url",
    "deeplx_url",
];

/// 민감하지 않아 노출 플래그 없이 원문 조회가 가능한 키
const BUILTIN_EXPORTABLE: &[&str] = &[
    "libre_url",
    "lingva_url",
    "oneringtranslator_url",
    "deeplx_url",
];

static BUILTIN: Lazy<Arc<KeyCatalog>> = Lazy::new(|| {
    Arc::new(KeyCatalog::new(
        BUILTIN_KEYS.iter().copied(),
        BUILTIN_EXPORTABLE.iter().copied(),
    ))
});

/// 불변 키 카탈로그
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCatalog {
    known: Vec<String>,
    exportable: BTreeSet<String>,
}

impl KeyCatalog {
    /// 카탈로그 생성
    ///
    /// `known`의 순서를 유지하고 중복은 제거합니다.
    /// `exportable` 키는 `known`에 없더라도 조회 허용 목록에 들어갑니다.
    pub fn new<K, E>(known: K, exportable: E) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let known = known
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| seen.insert(k.clone()))
            .collect();

        Self {
            known,
            exportable: exportable.into_iter().map(Into::into).collect(),
        }
    }

    /// 기본 카탈로그
    pub fn builtin() -> Arc<KeyCatalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn known_keys(&self) -> &[String] {
        &self.known
    }

    pub fn contains(&self, key: &str) -> bool {
        self.known.iter().any(|k| k == key)
    }

    /// 노출 플래그 없이 원문 조회가 허용되는 키인지
    pub fn is_exportable(&self, key: &str) -> bool {
        self.exportable.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_exportable_keys_are_known() {
        let catalog = KeyCatalog::builtin();
        for key in BUILTIN_EXPORTABLE {
            assert!(catalog.contains(key), "{key} missing from known keys");
            assert!(catalog.is_exportable(key));
        }
        assert!(!catalog.is_exportable("api_key_openai"));
    }

    #[test]
    fn new_dedupes_and_keeps_order() {
        let catalog = KeyCatalog::new(["b", "a", "b", "c"], ["c"]);
        assert_eq!(catalog.known_keys(), &["b", "a", "c"]);
        assert!(catalog.is_exportable("c"));
        assert!(!catalog.is_exportable("a"));
    }
}
