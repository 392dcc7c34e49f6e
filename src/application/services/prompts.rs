use crate::domain::TemplateType;

/// The analysis items and template variant for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBundle {
    pub items: Vec<String>,
    pub template_type: TemplateType,
}

/// Which slice of a transcript a sub-call sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptPart {
    Whole,
    First,
    Second,
}

impl PromptBundle {
    pub fn new(items: Vec<String>, template_type: TemplateType) -> Self {
        Self {
            items,
            template_type,
        }
    }

    pub fn analysis_prompt(&self, part: TranscriptPart) -> String {
        let mut prompt = String::from(
            "You analyze transcripts of recorded consultations and write report sections.\n",
        );

        match self.template_type {
            TemplateType::Raw => prompt.push_str(
                "Quote the speakers closely. For each item, collect the statements from the \
                 transcript that address it, keeping their original wording.\n",
            ),
            TemplateType::Refined => prompt.push_str(
                "Write concise, well-structured prose. For each item, summarize what the \
                 transcript says about it in complete sentences.\n",
            ),
        }

        prompt.push_str(&self.items_block());
        prompt.push_str(
            "Answer in the language of the transcript. If the transcript says nothing about an \
             item, write \"Not mentioned\" for it. Do not invent content.\n",
        );

        match part {
            TranscriptPart::Whole => {}
            TranscriptPart::First => prompt.push_str(
                "\nThis is the FIRST half of a longer transcript. Cover only what appears here; \
                 the second half is analyzed separately.\n",
            ),
            TranscriptPart::Second => prompt.push_str(
                "\nThis is the SECOND half of a longer transcript. Its opening sentences repeat \
                 the end of the first half for context. Cover only what appears here.\n",
            ),
        }

        prompt
    }

    pub fn merge_prompt(&self) -> String {
        let mut prompt = String::from(
            "You receive two partial analyses of the same transcript, one per half, separated \
             by section delimiters. Merge them into a single analysis with one entry per item. \
             Remove duplicates caused by the overlapping passage and keep every distinct fact.\n",
        );
        prompt.push_str(&self.items_block());
        if self.template_type == TemplateType::Raw {
            prompt.push_str("Keep quoted wording intact.\n");
        }
        prompt
    }

    fn items_block(&self) -> String {
        if self.items.is_empty() {
            return "Produce a general summary with the key topics and outcomes.\n".to_string();
        }

        let mut block = String::from("Report items, in this order:\n");
        for (index, item) in self.items.iter().enumerate() {
            block.push_str(&format!("{}. {}\n", index + 1, item));
        }
        block
    }
}
