//! Built-in lesson content for Basic 01 Day 01 (self-introduction).
//!
//! The tutor can override this with a `lesson.json` file of the same shape;
//! see the script loader in the tutor service.

use crate::script::{
    Character, FreetalkScript, FreetalkSession, LectureStep, Lesson, RoleplayScenario, StepKind,
    WarmupBlock, WarmupSentence,
};

fn announce(utterance: &str, subtitle: Option<&str>) -> LectureStep {
    LectureStep {
        kind: StepKind::Announce,
        utterance: utterance.to_string(),
        subtitle: subtitle.map(str::to_string),
        display_text: None,
        placeholder: false,
    }
}

fn prompt(utterance: &str, display_text: &str) -> LectureStep {
    LectureStep {
        kind: StepKind::Prompt,
        utterance: utterance.to_string(),
        subtitle: None,
        display_text: Some(display_text.to_string()),
        placeholder: false,
    }
}

fn lecture_steps() -> Vec<LectureStep> {
    vec![
        announce(
            "Hello, everyone! Welcome to SELFit! 셀레나와 함께 하는 재미있는 스피킹! \
             SELFit에 온 걸 환영해. 나한테도 인사해 줄래?",
            Some("Hello, everyone! Welcome to SELFit!"),
        ),
        prompt("Hello, SELENA!", "Hello, SELENA!"),
        announce(
            "이제부터 재미있게 수업을 시작해 보자! 오늘 우리가 쓸 표현은 Nice to meet you! \
             처음 만났을 때 이렇게 말해. 자, 따라 말해볼까?",
            Some("Nice to meet you! 만나서 반갑습니다!"),
        ),
        prompt("Nice to meet you!", "Nice to meet you!"),
        announce(
            "그리고 난 다음에는 내가 누구인지 소개해야 해. 이럴 때는 I am 이라는 표현을 \
             쓸 수 있어. 먼저 한 번 따라 해볼까?",
            Some("I am 나는 ~예요"),
        ),
        prompt("I am", "I am"),
        announce("맞았어! 그리고 그 뒤에 이름을 넣으면 돼.", Some("I am + 이름")),
        prompt("I am SELENA.", "I am SELENA."),
        announce("자, 이번엔 네 이름도 넣어서 말해 볼래?", Some("I am + 이름")),
        LectureStep {
            kind: StepKind::Prompt,
            utterance: "I am".to_string(),
            subtitle: None,
            display_text: Some("I am _______.".to_string()),
            placeholder: true,
        },
        announce(
            "그리고 내가 어떤 사람인지 말할 때는 I am 뒤에 나의 특징을 넣으면 돼. \
             나는 행복하다고 말하고 싶다면?",
            Some("I am + 특징"),
        ),
        prompt("I am happy.", "I am happy."),
        announce("나는 학생이라고 말하고 싶다면?", Some("I am + 특징")),
        prompt("I am a student.", "I am a student."),
        announce("좋아! 그럼 지금부터 스피킹을 시작해 보자~ Here we go!", None),
    ]
}

fn sentence(english: &str, korean: &str) -> WarmupSentence {
    WarmupSentence {
        english: english.to_string(),
        korean: korean.to_string(),
    }
}

fn warmup_blocks() -> Vec<WarmupBlock> {
    vec![
        WarmupBlock {
            title: "회화 표현".to_string(),
            sentences: vec![sentence("Nice to meet you!", "만나서 반가워요!")],
        },
        WarmupBlock {
            title: "패턴 1".to_string(),
            sentences: vec![sentence("I am happy.", "나는 행복해요.")],
        },
        WarmupBlock {
            title: "패턴 1 단어 치환".to_string(),
            sentences: vec![
                sentence("I am sad.", "나는 슬퍼요."),
                sentence("I am hungry.", "나는 배고파요."),
            ],
        },
        WarmupBlock {
            title: "패턴 2".to_string(),
            sentences: vec![sentence("I am a student.", "나는 학생이에요.")],
        },
        WarmupBlock {
            title: "패턴 2 단어 치환".to_string(),
            sentences: vec![
                sentence("I am a boy.", "나는 남자아이에요."),
                sentence("I am a girl.", "나는 여자아이에요."),
            ],
        },
    ]
}

fn roleplay_scenarios() -> Vec<RoleplayScenario> {
    let scenario = |id: u32,
                    scene: &str,
                    opening: &str,
                    variants: &[&str],
                    choices: &[&str],
                    reaction: &str| RoleplayScenario {
        id,
        scene: scene.to_string(),
        opening_line: opening.to_string(),
        opening_variants: variants.iter().map(|s| s.to_string()).collect(),
        choices: choices.iter().map(|s| s.to_string()).collect(),
        reaction_line: reaction.to_string(),
    };

    vec![
        scenario(
            1,
            "학교 정문",
            "Hi! I am Selena. What is your name?",
            &["What's your name?", "Tell me your name."],
            &["I am Minsoo", "I am Jane", "I am Tom"],
            "Nice to meet you! Let's go in.",
        ),
        scenario(
            2,
            "교실",
            "How are you today?",
            &[],
            &["I am happy", "I am hungry", "I am tired"],
            "Good! I am happy, too.",
        ),
        scenario(
            3,
            "자기소개",
            "Who are you?",
            &[],
            &["I am a student", "I am a boy", "I am a girl"],
            "Yes, you are a great student!",
        ),
        scenario(
            4,
            "특징",
            "I am smart. How about you?",
            &[],
            &["I am smart, too", "I am fast", "I am strong"],
            "Awesome! We are both smart.",
        ),
        scenario(
            5,
            "마무리",
            "I am cool today. What about you?",
            &[],
            &["I am cool, too", "I am pretty", "I am tall"],
            "We are so cool! Bye-bye!",
        ),
    ]
}

fn characters() -> Vec<Character> {
    let character = |id: &str, name: &str, avatar: &str| Character {
        id: id.to_string(),
        name: name.to_string(),
        avatar: avatar.to_string(),
    };
    vec![
        character("selena", "Selena", "👩"),
        character("max", "Max", "👨"),
        character("luna", "Luna", "👧"),
        character("leo", "Leo", "👦"),
    ]
}

fn freetalk_script() -> FreetalkScript {
    let lines = |lines: &[&str]| FreetalkSession {
        ai_lines: lines.iter().map(|s| s.to_string()).collect(),
    };
    FreetalkScript {
        topic: "자기소개하기 (Greeting & Self-introduction)".to_string(),
        sessions: vec![
            lines(&[
                "I am so happy to talk to you! How are you today?",
                "Great! I am happy, too! Are you a student?",
                "Nice to meet you! What is your name?",
                "Wonderful! It was nice talking. Let's do one more round!",
            ]),
            lines(&[
                "Hi again! How are you feeling now?",
                "You are doing great! Are you smart?",
                "I am a teacher. Who are you?",
                "We did a great job today. Bye-bye! See you next time!",
            ]),
        ],
        hint_phrases: vec![
            "I am happy / sad / hungry.".to_string(),
            "I am a student.".to_string(),
            "My name is ___.".to_string(),
        ],
        fallback_replies: vec![
            "I am happy.".to_string(),
            "I am a student.".to_string(),
            "My name is Minsoo.".to_string(),
        ],
        turns_per_session: 3,
    }
}

/// The fixed Basic 01 Day 01 lesson.
pub fn builtin_lesson() -> Lesson {
    Lesson {
        course: "Basic 01 Day 01".to_string(),
        topic: "자기소개하기".to_string(),
        lecture: lecture_steps(),
        warmup: warmup_blocks(),
        roleplay: roleplay_scenarios(),
        characters: characters(),
        freetalk: freetalk_script(),
    }
}
