//! Voice catalog and preference rules.
//!
//! Platform voice lists arrive asynchronously and vary wildly in quality.
//! The catalog caches one preferred voice per language and can be
//! invalidated when the platform repopulates its list, so the output port
//! queries it lazily instead of racing a global mutation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Ko,
}

impl Lang {
    pub fn bcp47(self) -> &'static str {
        match self {
            Lang::En => "en-US",
            Lang::Ko => "ko-KR",
        }
    }
}

/// Korean when the text contains any Hangul syllable, English otherwise.
pub fn detect_lang(text: &str) -> Lang {
    if text.chars().any(|c| ('가'..='힣').contains(&c)) {
        Lang::Ko
    } else {
        Lang::En
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP 47 tag reported by the platform, e.g. "en-US" or "ko-KR".
    pub lang: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

fn name_has(name: &str, keywords: &[&str]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn is_mobile(name: &str) -> bool {
    name_has(name, &["mobile", "compact"])
}

/// Korean preference chain: natural-quality keyword, then a non-mobile
/// vendor-branded voice, then a female-labeled voice, then whatever exists.
fn preferred_ko(voices: &[VoiceInfo]) -> Option<usize> {
    let ko: Vec<usize> = voices
        .iter()
        .enumerate()
        .filter(|(_, v)| v.lang.starts_with("ko"))
        .map(|(i, _)| i)
        .collect();
    if ko.is_empty() {
        return None;
    }

    let pick = |pred: &dyn Fn(&VoiceInfo) -> bool| ko.iter().copied().find(|&i| pred(&voices[i]));

    pick(&|v| name_has(&v.name, &["natural", "neural", "premium"]))
        .or_else(|| pick(&|v| name_has(&v.name, &["google", "microsoft"]) && !is_mobile(&v.name)))
        .or_else(|| pick(&|v| name_has(&v.name, &["female", "woman"])))
        .or(ko.first().copied())
}

/// English preference chain: non-mobile vendor/quality keyword, then a
/// female-labeled voice, then whatever exists.
fn preferred_en(voices: &[VoiceInfo]) -> Option<usize> {
    let en: Vec<usize> = voices
        .iter()
        .enumerate()
        .filter(|(_, v)| v.lang.starts_with("en"))
        .map(|(i, _)| i)
        .collect();
    if en.is_empty() {
        return None;
    }

    let pick = |pred: &dyn Fn(&VoiceInfo) -> bool| en.iter().copied().find(|&i| pred(&voices[i]));

    pick(&|v| {
        name_has(
            &v.name,
            &["google", "microsoft", "natural", "online", "female", "woman"],
        ) && !is_mobile(&v.name)
    })
    .or_else(|| pick(&|v| name_has(&v.name, &["female", "woman", "zira", "samantha"])))
    .or(en.first().copied())
}

#[derive(Debug, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceInfo>,
    cached_en: Option<usize>,
    cached_ko: Option<usize>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<VoiceInfo>) -> Self {
        Self {
            voices,
            cached_en: None,
            cached_ko: None,
        }
    }

    /// Whether the platform has populated the voice list yet.
    pub fn is_ready(&self) -> bool {
        !self.voices.is_empty()
    }

    /// Replaces the voice list (e.g. after the platform's late population)
    /// and drops the cached picks.
    pub fn replace(&mut self, voices: Vec<VoiceInfo>) {
        self.voices = voices;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.cached_en = None;
        self.cached_ko = None;
    }

    /// The preferred voice for `lang`, computed once and cached until
    /// invalidated.
    pub fn preferred(&mut self, lang: Lang) -> Option<&VoiceInfo> {
        let slot = match lang {
            Lang::En => &mut self.cached_en,
            Lang::Ko => &mut self.cached_ko,
        };
        if slot.is_none() {
            *slot = match lang {
                Lang::En => preferred_en(&self.voices),
                Lang::Ko => preferred_ko(&self.voices),
            };
        }
        slot.map(|i| &self.voices[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str, lang: &str) -> VoiceInfo {
        VoiceInfo::new(name, lang)
    }

    #[test]
    fn detects_korean_from_hangul() {
        assert_eq!(detect_lang("만나서 반가워요"), Lang::Ko);
        assert_eq!(detect_lang("SELFit에 온 걸 환영해"), Lang::Ko);
        assert_eq!(detect_lang("Nice to meet you!"), Lang::En);
    }

    #[test]
    fn korean_chain_prefers_natural_then_vendor_then_female() {
        let mut catalog = VoiceCatalog::new(vec![
            v("Kyuri Mobile", "ko-KR"),
            v("Microsoft Heami", "ko-KR"),
            v("Sunhi Neural", "ko-KR"),
        ]);
        assert_eq!(catalog.preferred(Lang::Ko).unwrap().name, "Sunhi Neural");

        let mut catalog = VoiceCatalog::new(vec![
            v("Kyuri Mobile", "ko-KR"),
            v("Google 한국어", "ko-KR"),
        ]);
        assert_eq!(catalog.preferred(Lang::Ko).unwrap().name, "Google 한국어");

        let mut catalog = VoiceCatalog::new(vec![
            v("Kyuri", "ko-KR"),
            v("Yuna Female", "ko-KR"),
        ]);
        assert_eq!(catalog.preferred(Lang::Ko).unwrap().name, "Yuna Female");
    }

    #[test]
    fn english_chain_skips_mobile_vendor_voices() {
        let mut catalog = VoiceCatalog::new(vec![
            v("Google US English Mobile", "en-US"),
            v("Samantha", "en-US"),
            v("Microsoft Zira Online", "en-US"),
        ]);
        assert_eq!(
            catalog.preferred(Lang::En).unwrap().name,
            "Microsoft Zira Online"
        );
    }

    #[test]
    fn falls_back_to_first_voice_of_the_language() {
        let mut catalog = VoiceCatalog::new(vec![v("Fred", "en-AU"), v("Bert", "en-GB")]);
        assert_eq!(catalog.preferred(Lang::En).unwrap().name, "Fred");
        assert!(catalog.preferred(Lang::Ko).is_none());
    }

    #[test]
    fn replace_invalidates_the_cached_pick() {
        let mut catalog = VoiceCatalog::new(vec![v("Fred", "en-US")]);
        assert_eq!(catalog.preferred(Lang::En).unwrap().name, "Fred");

        catalog.replace(vec![v("Google US English", "en-US"), v("Fred", "en-US")]);
        assert_eq!(
            catalog.preferred(Lang::En).unwrap().name,
            "Google US English"
        );
    }

    #[test]
    fn empty_catalog_is_not_ready() {
        let catalog = VoiceCatalog::default();
        assert!(!catalog.is_ready());
    }
}
