//! Prompt builders for the three oracle tasks. Each prompt names the exact JSON
//! keys the normalizer looks for.

pub const FACT_KEYS: &str =
    "factualAccuracy, bias, sourceQuality, trustScore, status, message, flags, highlights, keywords, sources";
pub const MEDIA_KEYS: &str =
    "isOriginal, confidence, message, flags, highlights, technicalIndicators { inconsistencies, artifacts, metadata }";
pub const SOURCE_KEYS: &str =
    "score, trustSignals[], risks[], summary, recency, recommendations[]";

/// Fact-check prompt for pasted text. The content is quoted verbatim.
pub fn fact_analysis(content: &str) -> String {
    format!(
        "Assess the following content for misinformation or deceptive framing.\n\
         Report:\n\
         1. an overall credibility score (0-100)\n\
         2. red flags such as emotional language, missing sources, logical fallacies or bias\n\
         3. positive signals such as citations, balanced reporting or expert attribution\n\
         4. sources that could confirm or refute the claims, each with credibility and relevance (0-100)\n\
         Also rate factual accuracy, bias (100 = no bias) and source quality, each 0-100.\n\
         Status must be one of verified, suspicious, false.\n\
         Content: \"{content}\"\n\
         Respond with a single JSON object using the keys {FACT_KEYS}. \
         Each source is an object with name, url, credibility, relevance."
    )
}

/// Authenticity prompt; the image travels as an inline part.
pub fn image_authenticity() -> String {
    format!(
        "Decide whether the attached image is an original photograph or manipulated / AI generated.\n\
         Report:\n\
         1. an authenticity verdict\n\
         2. visible signs of editing or synthesis\n\
         3. technical indicators scored 0-100 (inconsistencies, artifacts, metadata)\n\
         4. your confidence in the verdict (0-100)\n\
         Respond with a single JSON object using the keys {MEDIA_KEYS}."
    )
}

pub fn source_credibility(url: &str) -> String {
    format!(
        "Evaluate how credible this online source is.\n\
         Report:\n\
         1. an overall credibility score (0-100)\n\
         2. trust signals such as references, named authors or reputation\n\
         3. risk factors or red flags\n\
         4. how recent the publication and its updates are\n\
         5. recommended verification steps\n\
         Source URL: {url}\n\
         Respond with a single JSON object using the keys {SOURCE_KEYS}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_input_and_keys() {
        let p = fact_analysis("the moon is cheese");
        assert!(p.contains("\"the moon is cheese\""));
        assert!(p.contains("sourceQuality"));

        assert!(image_authenticity().contains("technicalIndicators"));

        let s = source_credibility("https://example.org");
        assert!(s.contains("https://example.org"));
        assert!(s.contains("recommendations[]"));
    }
}
