// Note formatting prompt templates.

pub const FORMAT_NOTES_SYSTEM: &str = "You are an assistant that formats meeting notes.";

pub const FORMAT_NOTES_PROMPT: &str = "Reformat the notes from my meeting: {notes}";
