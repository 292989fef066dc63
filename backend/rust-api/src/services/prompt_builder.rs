use crate::models::{Language, Task, TaskPayload};

pub const DEFAULT_SUBJECT: &str = "General";

/// Builds the natural-language prompt for a task. User fields are inserted
/// verbatim after being clipped to `max_input_chars` characters.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_input_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_input_chars: usize) -> Self {
        Self { max_input_chars }
    }

    pub fn build(&self, task: Task, payload: &TaskPayload) -> String {
        let lang = Language::from_code(payload.language.as_deref());
        let text = self.clip(payload.text.as_deref());
        let question = self.clip(payload.question.as_deref());
        let context = self.clip(payload.context.as_deref());
        let answer = self.clip(payload.student_answer.as_deref());

        match (task, lang) {
            (Task::Summary, Language::En) => {
                format!("Summarize this for a high school learner:\n\n{text}")
            }
            (Task::Summary, Language::Fr) => {
                format!("Explique ce texte en français simplement pour un élève :\n\n{text}")
            }
            (Task::Summary, Language::Ar) => {
                format!("اشرح هذا النص بالعربية بلغة مبسطة لتلميذ:\n\n{text}")
            }

            (Task::Chat, Language::En) => format!(
                "Lesson context:\n{context}\n\nStudent question:\n{question}\n\nAnswer clearly."
            ),
            (Task::Chat, Language::Fr) => format!(
                "Contexte du cours:\n{context}\n\nQuestion:\n{question}\n\nRéponds clairement en français."
            ),
            (Task::Chat, Language::Ar) => format!(
                "محتوى الدرس:\n{context}\n\nسؤال الطالب:\n{question}\n\nأجب بوضوح بالعربية."
            ),

            (Task::Hint, Language::En) => format!(
                "Give a short one-sentence hint for this question (not the answer):\n\n{question}"
            ),
            (Task::Hint, Language::Fr) => format!(
                "Donne un indice court, en une phrase, pour cette question (pas la réponse) :\n\n{question}"
            ),
            (Task::Hint, Language::Ar) => format!(
                "أعطِ تلميحًا قصيرًا من جملة واحدة لهذا السؤال (وليس الإجابة):\n\n{question}"
            ),

            (Task::Exercises, Language::En) => format!(
                "From this lesson, create 3 short practice exercises (numbered):\n\n{text}"
            ),
            (Task::Exercises, Language::Fr) => {
                format!("À partir de ce cours, crée 3 exercices concis (numérotés) :\n\n{text}")
            }
            (Task::Exercises, Language::Ar) => {
                format!("بناءً على هذا الدرس، أنشئ 3 تمارين قصيرة مرقمة:\n\n{text}")
            }

            (Task::CheckAnswer, Language::En) => format!(
                "Question:\n{question}\n\nStudent's answer:\n{answer}\nEvaluate correctness and give a brief correction if needed."
            ),
            (Task::CheckAnswer, Language::Fr) => format!(
                "Question:\n{question}\n\nRéponse:\n{answer}\n Évalue si c'est correct et propose une correction brève."
            ),
            (Task::CheckAnswer, Language::Ar) => format!(
                "السؤال:\n{question}\n\nإجابة الطالب:\n{answer}\n قيّم الإجابة وقدّم تصحيحًا موجزًا إذا لزم."
            ),

            (Task::StudyChat, lang) => {
                let subject = self.subject(payload.subject.as_deref());
                format!("{}\n\n{question}", study_guard(lang, &subject))
            }
        }
    }

    fn clip(&self, value: Option<&str>) -> String {
        truncate_chars(value.unwrap_or_default(), self.max_input_chars).to_string()
    }

    fn subject(&self, value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(s) if !s.is_empty() => truncate_chars(s, self.max_input_chars).to_string(),
            _ => DEFAULT_SUBJECT.to_string(),
        }
    }
}

/// Fixed instruction block that keeps study chat on academic topics.
fn study_guard(lang: Language, subject: &str) -> String {
    match lang {
        Language::En => format!(
            "You are a study assistant for school students. Subject: {subject}.\n\
             Only answer academic questions related to school subjects. If the question is not \
             academic, politely refuse and invite the student to ask a study question.\n\n\
             Student question:"
        ),
        Language::Fr => format!(
            "Tu es un assistant d'étude pour élèves. Matière : {subject}.\n\
             Réponds uniquement aux questions scolaires. Si la question n'est pas scolaire, \
             refuse poliment et invite l'élève à poser une question d'étude. Réponds en français.\n\n\
             Question de l'élève :"
        ),
        Language::Ar => format!(
            "أنت مساعد دراسي للتلاميذ. المادة: {subject}.\n\
             أجب فقط عن الأسئلة الدراسية. إذا لم يكن السؤال دراسيًا، فاعتذر بلطف وادعُ التلميذ إلى طرح سؤال دراسي. أجب بالعربية.\n\n\
             سؤال التلميذ:"
        ),
    }
}

/// Cuts on a char boundary after at most `max` characters.
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
