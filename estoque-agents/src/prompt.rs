//! Prompt templates with `{name}` placeholders.
//!
//! `{{` and `}}` render as literal braces, so templates that contain JSON or
//! code samples can still be used.

use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Instructions wrapped around every inventory question
pub const INVENTORY_PROMPT_TEMPLATE: &str = "
Use as ferramentas necessárias para responder perguntas relacionadas ao
estoque de produtos. Você fornecerá insights sobre produtos, preços,
reposição de estoque e relatórios conforme solicitado pelo usuário.
A resposta final deve ter uma formatação amigável de visualização para o usuário.
Sempre responda em português brasileiro.
Pergunta: {q}
";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Missing value for template variable '{0}'")]
    MissingVariable(String),

    #[error("Unclosed '{{' at position {position}")]
    UnclosedBrace { position: usize },

    #[error("Unmatched '}}' at position {position}")]
    UnmatchedBrace { position: usize },

    #[error("Empty placeholder at position {position}")]
    EmptyPlaceholder { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }

                    let mut name = String::new();
                    let mut closed = false;
                    for (_, next) in chars.by_ref() {
                        match next {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateError::UnclosedBrace { position }),
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedBrace { position });
                    }

                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder { position });
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Variable(name.to_string()));
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(TemplateError::UnmatchedBrace { position });
                    }
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Template text as it was parsed
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names, in order of first appearance
    pub fn input_variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Variable(name) = segment {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Render the template. Values for names the template does not use are ignored.
    pub fn format(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        let values: HashMap<&str, &str> = values.iter().copied().collect();

        let mut output = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Variable(name) => {
                    let value = values
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::MissingVariable(name.clone()))?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

fn inventory_template() -> Result<&'static PromptTemplate, TemplateError> {
    static TEMPLATE: OnceLock<PromptTemplate> = OnceLock::new();
    if let Some(template) = TEMPLATE.get() {
        return Ok(template);
    }
    let parsed = PromptTemplate::parse(INVENTORY_PROMPT_TEMPLATE)?;
    Ok(TEMPLATE.get_or_init(|| parsed))
}

/// Wrap a user question in the inventory instructions
pub fn format_inventory_prompt(question: &str) -> Result<String, TemplateError> {
    inventory_template()?.format(&[("q", question)])
}
