mod plain_text_template_extractor;

pub use plain_text_template_extractor::PlainTextTemplateExtractor;
