use serde::Serialize;

/// A labelled example shown to users who want to try the classifier.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SampleTweet {
    pub title: &'static str,
    pub text: &'static str,
}

pub const SAMPLE_TWEETS: [SampleTweet; 5] = [
    SampleTweet {
        title: "Toxic Example",
        text: "This is absolutely disgusting! People like you should be banned from social media. Horrible!",
    },
    SampleTweet {
        title: "Neutral Example",
        text: "Just finished my morning coffee. Weather is okay today, nothing special.",
    },
    SampleTweet {
        title: "Positive Example",
        text: "So grateful for all the support today! Amazing community, thank you everyone! 🙏",
    },
    SampleTweet {
        title: "Sarcastic/Toxic",
        text: "Oh wonderful, another day of dealing with this nonsense. Just perfect...",
    },
    SampleTweet {
        title: "Informal Positive",
        text: "This made my day! So happy right now! Best news ever! 🔥",
    },
];
