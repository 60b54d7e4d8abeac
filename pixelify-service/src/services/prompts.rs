//! Fixed prompt text for each deployment variant.

use crate::config::Variant;

/// Number of description characters carried into the generation prompt.
pub const DESCRIPTION_EXCERPT_CHARS: usize = 150;

const SANTA_PERSONA: &str = "You are a creative Christmas artist. Transform any character into a \
festive Santa version by adding Santa's iconic hat and beard while keeping the original \
character's features and personality.";

const SANTA_INSTRUCTION: &str = "Analyze this character and describe how it would look as a \
Santa version. The character should keep its original appearance, body shape, and features, \
but add: a classic red Santa hat with white trim and pom-pom, and a fluffy white Santa beard. \
Describe the colors, style, and how the Santa elements blend with the character's original \
design. Be detailed and creative!";

const SANTA_GENERATION_TEMPLATE: &str = "Transform this character into a Santa version: keep the \
original character exactly as it is, but add a classic red Santa hat with white fluffy trim and \
a white pom-pom on top, and a fluffy white Santa beard. The character should maintain its \
original style, colors, body shape, and personality. {description}. Professional illustration \
style, clean white background.";

const POKEMON_PERSONA: &str = "You are a creative pixel art artist who specializes in retro \
Pokemon sprites. You reimagine any subject as a Pokemon drawn in the style of the classic \
handheld games.";

const POKEMON_INSTRUCTION: &str = "Analyze this image and describe the Pokemon it would become. \
Give it a name, a type, and describe its pixel-art sprite in detail: the limited color palette, \
the silhouette, the key features carried over from the original image, and its personality. \
Be detailed and creative!";

const POKEMON_GENERATION_TEMPLATE: &str = "A retro 16-bit pixel art Pokemon sprite: \
{description}. Limited color palette, crisp pixel edges, plain white background.";

/// The fixed prompts one variant sends to the providers.
#[derive(Debug, Clone, Copy)]
pub struct VariantPrompts {
    pub persona: &'static str,
    pub instruction: &'static str,
    generation_template: &'static str,
}

impl VariantPrompts {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Santa => Self {
                persona: SANTA_PERSONA,
                instruction: SANTA_INSTRUCTION,
                generation_template: SANTA_GENERATION_TEMPLATE,
            },
            Variant::Pokemon => Self {
                persona: POKEMON_PERSONA,
                instruction: POKEMON_INSTRUCTION,
                generation_template: POKEMON_GENERATION_TEMPLATE,
            },
        }
    }

    /// Fill the generation template with the start of the description.
    pub fn generation_prompt(&self, description: &str) -> String {
        self.generation_template
            .replace("{description}", &excerpt(description, DESCRIPTION_EXCERPT_CHARS))
    }
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
