//! Stage catalog: the fixed sequence of questions and their display data.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One step of the conversation.
///
/// Progresses linearly: Start → Goal → Persona → Task → Whom → How →
/// Format → Constraints → Tool → Quality → Finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Goal,
    Persona,
    Task,
    Whom,
    How,
    Format,
    Constraints,
    Tool,
    Quality,
    #[serde(rename = "openai")]
    Finalize,
}

/// Order in which collected answers appear in the draft prompt.
///
/// How comes before Whom here, unlike the conversation order.
pub const SUMMARY_ORDER: [Stage; 9] = [
    Stage::Goal,
    Stage::Persona,
    Stage::Task,
    Stage::How,
    Stage::Whom,
    Stage::Format,
    Stage::Constraints,
    Stage::Tool,
    Stage::Quality,
];

impl Stage {
    /// All stages in conversation order.
    pub const ALL: [Stage; 11] = [
        Stage::Start,
        Stage::Goal,
        Stage::Persona,
        Stage::Task,
        Stage::Whom,
        Stage::How,
        Stage::Format,
        Stage::Constraints,
        Stage::Tool,
        Stage::Quality,
        Stage::Finalize,
    ];

    /// Get the next stage in the linear progression, if any.
    pub fn next(&self) -> Option<Stage> {
        use Stage::*;
        match self {
            Start => Some(Goal),
            Goal => Some(Persona),
            Persona => Some(Task),
            Task => Some(Whom),
            Whom => Some(How),
            How => Some(Format),
            Format => Some(Constraints),
            Constraints => Some(Tool),
            Tool => Some(Quality),
            Quality => Some(Finalize),
            Finalize => None,
        }
    }

    /// Whether this stage ends the question sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalize)
    }

    /// Whether the user is offered a skip button at this stage.
    pub fn is_skippable(&self) -> bool {
        self.skip_suggestion().is_some()
    }

    /// Identifier used in button callback data.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Goal => "goal",
            Self::Persona => "persona",
            Self::Task => "task",
            Self::Whom => "whom",
            Self::How => "how",
            Self::Format => "format",
            Self::Constraints => "constraints",
            Self::Tool => "tool",
            Self::Quality => "quality",
            Self::Finalize => "openai",
        }
    }

    /// Lines shown to the user when the stage is entered.
    pub fn prompt_text(&self) -> &'static [&'static str] {
        match self {
            Self::Start => &[
                "🤖️ Welcome!",
                "\n- I will help you create a great prompt for ChatGPT!",
                "\n- I will ask you for the information interactively. ",
                "\n- There are 9 steps. The first 4 steps are mandatory",
                "\n- At the end, I will show you a summary of your answers",
                "and the option to enhance your prompt if you don't want to change anything",
                "\n- Once your prompt is enhanced,",
                "all you have to do is to copy it and paste it in ChatGPT\n",
                "- Click on \"Start again\" anytime to start all over\n",
                "- ** Don't enter any personal information**\n",
            ],
            Self::Goal => &[
                "1️⃣",
                "Problem or Purpose",
                "State what you want to achieve or the problem you want to solve",
                "The goal is the ultimate reason why you are writing the prompt",
                "It represents your long-term vision",
                "The goal can be divided into sub-goals or tasks, which you will define later",
            ],
            Self::Persona => &[
                "2️⃣",
                "Persona & Style",
                "Ask ChatGPT to adopt a persona or a role",
                "Select the persona, role or identity you want ChatGPT to adopt",
                "Also, you can select a style of communication that you want ChatGPT to use",
            ],
            Self::Task => &[
                "3️⃣",
                "The What",
                "Task definition",
                "What do you want ChatGPT to do?",
                "You can divide the goal into tasks",
            ],
            Self::Whom => &[
                "4️⃣",
                "Provide context about the intended audience. Who is it for?",
            ],
            Self::How => &["5️⃣", "How should ChatGPT do the task?"],
            Self::Format => &[
                "6️⃣",
                "Format",
                "Select the output format for your prompt. You can choose more than one",
            ],
            Self::Constraints => &[
                "7️⃣",
                "Constraints",
                "Enter any assumptions, restrictions or constraints that ChatGPT should follow",
                "Think of anything that ChatGPT should consider or that should not do",
            ],
            Self::Tool => &[
                "8️⃣",
                "Tools",
                "List a tool, model or framework that ChatGPT should use for the task",
            ],
            Self::Quality => &[
                "9️⃣",
                "Quality",
                "Decide on how to assure quality in your prompt",
            ],
            Self::Finalize => &["Connect with OpenAI"],
        }
    }

    /// Example answers, display only.
    pub fn examples(&self) -> &'static [&'static str] {
        match self {
            Self::Start => &["None"],
            Self::Goal => &[
                "Learn Excel",
                "Understand Bayes theorem",
                "Achieve my goals in life",
                "Assess my business idea",
                "Lose weight",
                "Learn Python",
                "Have a great vacation at Rome",
                "Write a book",
            ],
            Self::Persona => &[
                "Expert in Excel with a technical style",
                "Math teacher with a formal style",
                "Coach with a casual style",
                "Steve Jobs",
                "Shakespeare",
                "Nutritionist",
                "SEO expert",
                "Movie critic in a humorous style",
                "Math tutor with a simple language",
                "Python expert",
                "Customer service representative with a kind style",
                "Communications specialist",
                "Travel agent with a professional style",
                "Writing assistant",
            ],
            Self::Task => &[
                "Write the first chapter of a book",
                "Assemble a course syllabus",
                "Answer this email",
                "Write a blog post",
                "Write an email",
                "Outline a diet plan",
                "Solve a problem in Excel",
                "Teach basics of Python",
                "Help me plan a vacation at Rome",
                "Correct my text",
                "Write a poem",
                "Answer a query",
                "Summarize a document",
                "Create a business plan",
                "Respond an email",
                "Summarize my inbox provided between triple quotes",
            ],
            Self::Whom => &[
                "For a person with no previous experience",
                "For busy professionals",
                "For absolute beginners",
                "For a 5 year old children",
                "For experts",
                "For a lawyer",
                "For a person with no technical background",
                "For a marketing specialist",
            ],
            Self::How => &[
                "Use a step-by-step approach",
                "Use this as a context: ",
                "Use the following examples: 1+2=3",
                "Use the following inputs delimited by <> to answer questions",
                "Answer with citations to provided sources",
                "Use the following categories to classify the information: Good, Bad, Indifferent",
                "Use this categories: 'Great = positive', 'Not working = negative', 'Helpful = positive'",
                "Summarize the book/article/document by summarizing each section which I will provide to you",
                "Make a Quick summary",
            ],
            Self::Format => &[
                "Text",
                "Table",
                "List",
                "Summary",
                "Code snippet",
                "Plain text",
                "Rich text",
                "Gantt chart",
                "Word cloud",
                "Emoji",
                "Bullet points",
                "json",
                "CSV",
                "HTML",
                "XML",
                "Markdown",
            ],
            Self::Constraints => &[
                "Maximum 500 words",
                "The course duration should be 3 weeks",
                "Summarize in 3 paragraphs",
                "Minimize the use of jargon",
                "Short sentence",
                "500 words",
                "Use scientific sources",
                "Avoid sensitive subjects",
                "Include the phrase x",
                "include the words abc",
                "add pop culture references",
                "include terminology from x",
            ],
            Self::Tool => &[
                "SWOT analysis",
                "Business model canvas",
                "Ben Franklin",
                "Six hats of Bono",
                "Pareto principle",
                "Five forces of Porter",
                "Niche vision",
                "Brainstorming",
                "Constructivism /Cognitivism / Behaviorism",
                "Decision matrix",
                "Business/Lean model canvas",
                "Design thinking",
                "Persona analysis",
                "Agile framework",
                "OKRs",
            ],
            Self::Quality => &[
                "Work out your own (ChatGPT) solution before coming to a conclusion",
                "Use instructional design best practices",
                "Make sure you don't miss anything from previous steps",
                "Don't miss important context",
                "Think step-by-step",
                "Conduct an In-depth analysis",
                "Provide feedback based on clarity, completeness, and effectiveness",
                "Let's iterate on this response. Please provide an initial answer, and based on that, \
                 suggest an improved version that better matches our intended tone and purpose",
                "Feel free to adjust the phrasing, context, or details for a more accurate outcome.",
            ],
            Self::Finalize => &["Your prompt will be enhanced when you press 'Perfect my prompt'"],
        }
    }

    /// Prefix for this stage's answer in the draft prompt.
    pub fn summary_label(&self) -> Option<&'static str> {
        match self {
            Self::Goal => Some("My goal is:"),
            Self::Persona => Some("Assume you are:"),
            Self::Task => Some("Your task is to:"),
            Self::How => Some("To do the task you have to consider:"),
            Self::Whom => Some("The audience is:"),
            Self::Format => Some("The output format is:"),
            Self::Constraints => Some("Consider the following constraints and assumptions:"),
            Self::Tool => Some("Use the following tools:"),
            Self::Quality => Some("To assure quality, you have to:"),
            Self::Start | Self::Finalize => None,
        }
    }

    /// Line added to the enhancement text when the stage was skipped.
    pub fn skip_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::How => Some(
                "Add to the prompt your suggestions for the best way, steps, \
                 strategy or approach to do the task.",
            ),
            Self::Format => Some("Add to the prompt the best output format for the prompt."),
            Self::Constraints => Some(
                "Add to the prompt your suggestions regarding assumptions, \
                 restrictions or constraints.",
            ),
            Self::Tool => Some(
                "Add to the prompt your suggestions of the best conceptual tools for the task.",
            ),
            Self::Quality => Some(
                "Add to the prompt your suggestions regarding the best way to assure \
                 quality in the prompt.",
            ),
            _ => None,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Start
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Callback data that names no stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.code() == s)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}
