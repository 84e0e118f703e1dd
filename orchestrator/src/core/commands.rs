//! Command table
//!
//! Every chat command the bot understands, with the shape of its arguments
//! and the action it maps to. Dispatch lives in the bot; this module only
//! turns names and argument lists into typed values.

use shared::ContentType;

pub const WHATSAPP_TYPES: &[&str] = &["news", "deadline", "educational", "referral", "re-engagement"];
pub const STORY_TYPES: &[&str] = &["poll", "question", "countdown", "quiz", "tip"];

/// Accepted argument layout for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    None,
    /// Free text, joined with single spaces
    OptionalTopic,
    /// `ig`/`fb` anywhere in the arguments plus free text
    PlatformTopic,
    /// Known subtypes become `type: <x>`; anything else passes through
    OptionalSubtype(&'static [&'static str]),
    OptionalPhase,
    Confirm,
    /// `ph|tp <article id>`
    PublishTarget,
}

/// Fixed-size batch behind a shortcut command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPreset {
    pub content_type: ContentType,
    pub count: usize,
    pub topics: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Start,
    Help,
    Single(ContentType),
    Batch(BatchPreset),
    Weekly,
    News,
    Topics,
    Stats,
    Phase,
    Publish,
}

impl CommandAction {
    /// Whether the action calls the generative API and takes the busy gate
    pub fn generates(&self) -> bool {
        matches!(
            self,
            CommandAction::Single(_)
                | CommandAction::Batch(_)
                | CommandAction::Weekly
                | CommandAction::News
                | CommandAction::Topics
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub shape: ArgShape,
    pub action: CommandAction,
    pub summary: &'static str,
}

const CAPTION_TOPICS: &[&str] = &[
    "for instagram about eligibility",
    "for facebook about documents needed",
    "for instagram about the process",
    "for facebook about pricing",
    "for instagram about vulnerability clause",
    "for facebook about referral program",
    "for instagram about deadline",
    "for facebook about AI document validation",
    "for instagram about success stories",
    "for facebook about getting started",
];

const WHATSAPP_TOPICS: &[&str] = &[
    "type: news",
    "type: deadline",
    "type: educational",
    "type: referral",
    "type: re-engagement",
];

const STORY_TOPICS: &[&str] = &[
    "type: poll",
    "type: question",
    "type: countdown",
    "type: quiz",
    "type: tip",
    "type: poll",
    "type: question",
];

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "start",
        shape: ArgShape::None,
        action: CommandAction::Start,
        summary: "Welcome banner",
    },
    CommandSpec {
        name: "help",
        shape: ArgShape::None,
        action: CommandAction::Help,
        summary: "This message",
    },
    CommandSpec {
        name: "blog",
        shape: ArgShape::OptionalTopic,
        action: CommandAction::Single(ContentType::Blog),
        summary: "SEO blog article",
    },
    CommandSpec {
        name: "tiktok",
        shape: ArgShape::OptionalTopic,
        action: CommandAction::Single(ContentType::Tiktok),
        summary: "TikTok script",
    },
    CommandSpec {
        name: "carousel",
        shape: ArgShape::OptionalTopic,
        action: CommandAction::Single(ContentType::Carousel),
        summary: "Instagram carousel",
    },
    CommandSpec {
        name: "caption",
        shape: ArgShape::PlatformTopic,
        action: CommandAction::Single(ContentType::Caption),
        summary: "Social caption",
    },
    CommandSpec {
        name: "whatsapp",
        shape: ArgShape::OptionalSubtype(WHATSAPP_TYPES),
        action: CommandAction::Single(ContentType::Whatsapp),
        summary: "WhatsApp message",
    },
    CommandSpec {
        name: "fbpost",
        shape: ArgShape::OptionalTopic,
        action: CommandAction::Single(ContentType::FbPost),
        summary: "Facebook group post",
    },
    CommandSpec {
        name: "story",
        shape: ArgShape::OptionalSubtype(STORY_TYPES),
        action: CommandAction::Single(ContentType::Story),
        summary: "Instagram Story",
    },
    CommandSpec {
        name: "tiktok5",
        shape: ArgShape::None,
        action: CommandAction::Batch(BatchPreset {
            content_type: ContentType::Tiktok,
            count: 5,
            topics: &[],
        }),
        summary: "5 TikTok scripts",
    },
    CommandSpec {
        name: "carousel3",
        shape: ArgShape::None,
        action: CommandAction::Batch(BatchPreset {
            content_type: ContentType::Carousel,
            count: 3,
            topics: &[],
        }),
        summary: "3 carousel sets",
    },
    CommandSpec {
        name: "captions10",
        shape: ArgShape::None,
        action: CommandAction::Batch(BatchPreset {
            content_type: ContentType::Caption,
            count: 10,
            topics: CAPTION_TOPICS,
        }),
        summary: "10 social captions",
    },
    CommandSpec {
        name: "whatsapp5",
        shape: ArgShape::None,
        action: CommandAction::Batch(BatchPreset {
            content_type: ContentType::Whatsapp,
            count: 5,
            topics: WHATSAPP_TOPICS,
        }),
        summary: "5 WhatsApp messages",
    },
    CommandSpec {
        name: "fbpost5",
        shape: ArgShape::None,
        action: CommandAction::Batch(BatchPreset {
            content_type: ContentType::FbPost,
            count: 5,
            topics: &[],
        }),
        summary: "5 Facebook posts",
    },
    CommandSpec {
        name: "stories7",
        shape: ArgShape::None,
        action: CommandAction::Batch(BatchPreset {
            content_type: ContentType::Story,
            count: 7,
            topics: STORY_TOPICS,
        }),
        summary: "7 Story concepts",
    },
    CommandSpec {
        name: "weekly",
        shape: ArgShape::Confirm,
        action: CommandAction::Weekly,
        summary: "Full weekly pack (46 pieces)",
    },
    CommandSpec {
        name: "news",
        shape: ArgShape::None,
        action: CommandAction::News,
        summary: "Latest regularización news",
    },
    CommandSpec {
        name: "topics",
        shape: ArgShape::None,
        action: CommandAction::Topics,
        summary: "10 topic suggestions",
    },
    CommandSpec {
        name: "stats",
        shape: ArgShape::None,
        action: CommandAction::Stats,
        summary: "Generation statistics",
    },
    CommandSpec {
        name: "phase",
        shape: ArgShape::OptionalPhase,
        action: CommandAction::Phase,
        summary: "Set or clear the campaign phase",
    },
    CommandSpec {
        name: "publish",
        shape: ArgShape::PublishTarget,
        action: CommandAction::Publish,
        summary: "Publish a generated blog article",
    },
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

fn platform(arg: &str) -> Option<&'static str> {
    match arg.to_lowercase().as_str() {
        "ig" | "instagram" => Some("instagram"),
        "fb" | "facebook" => Some("facebook"),
        _ => None,
    }
}

/// Topic for a single generation, `None` when the caller gave nothing usable
pub fn resolve_topic(shape: ArgShape, args: &[String]) -> Option<String> {
    let topic = match shape {
        ArgShape::OptionalTopic => args.join(" "),
        ArgShape::PlatformTopic => {
            let mut chosen = None;
            let mut words = Vec::new();
            for arg in args {
                match platform(arg) {
                    Some(name) => chosen = Some(name),
                    None => words.push(arg.as_str()),
                }
            }
            let text = words.join(" ");
            match (chosen, text.is_empty()) {
                (Some(name), true) => format!("for {name}"),
                (Some(name), false) => format!("for {name}. {text}"),
                (None, _) => text,
            }
        }
        ArgShape::OptionalSubtype(known) => match args.first() {
            Some(arg) if known.contains(&arg.to_lowercase().as_str()) => {
                format!("type: {}", arg.to_lowercase())
            }
            Some(arg) => arg.clone(),
            None => String::new(),
        },
        ArgShape::None | ArgShape::OptionalPhase | ArgShape::Confirm | ArgShape::PublishTarget => String::new(),
    };

    let topic = topic.trim();
    if topic.is_empty() {
        None
    } else {
        Some(topic.to_string())
    }
}

fn usage(spec: &CommandSpec) -> String {
    let args = match spec.shape {
        ArgShape::None => "",
        ArgShape::OptionalTopic => " \\[topic\\]",
        ArgShape::PlatformTopic => " \\[ig|fb\\] \\[topic\\]",
        ArgShape::OptionalSubtype(_) => " \\[type\\]",
        ArgShape::OptionalPhase => " \\[phase\\]",
        ArgShape::Confirm => " \\[confirm\\]",
        ArgShape::PublishTarget => " ph|tp <id>",
    };
    format!("  /{}{} — {}", spec.name, args, spec.summary)
}

/// Command list grouped the way the help message shows it
pub fn help_text() -> String {
    let groups: [(&str, fn(&CommandAction) -> bool); 4] = [
        ("Single Generation", |a| matches!(a, CommandAction::Single(_))),
        ("Batch Generation", |a| matches!(a, CommandAction::Batch(_))),
        ("Mega Batch", |a| matches!(a, CommandAction::Weekly)),
        ("Tools", |a| {
            matches!(
                a,
                CommandAction::News
                    | CommandAction::Topics
                    | CommandAction::Stats
                    | CommandAction::Phase
                    | CommandAction::Publish
                    | CommandAction::Help
            )
        }),
    ];

    let mut text = String::from("🤖 *Content Bot — Commands*\n");
    for (title, belongs) in groups {
        text.push_str(&format!("\n*{title}:*\n"));
        for spec in COMMANDS.iter().filter(|spec| belongs(&spec.action)) {
            text.push_str(&usage(spec));
            text.push('\n');
        }
    }
    text
}
