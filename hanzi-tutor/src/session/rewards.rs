//! Point rules and learner-facing messages
//!
//! Points are only ever awarded as the improvement over the stored best:
//! repeating a mastered character earns nothing.

/// Writing points for a pass: improvement over the previous high score
pub fn writing_points(score: i64, old_high_score: i64) -> i64 {
    (score - old_high_score).max(0)
}

/// Pronunciation points: two per star above the previous best
pub fn pronunciation_points(stars: i64, old_stars: i64) -> i64 {
    (stars - old_stars).max(0) * 2
}

pub const WRONG_ORDER_HINT: &str = "笔顺不太对哦，下次要按顺序写呢。";
pub const FAIL_FEEDBACK: &str = "这个字写得不太对哦，加油再试一次！";
pub const FAIL_SPEECH: &str = "要细心一点哦，加把劲！";
pub const REVIEW_PASS_FEEDBACK: &str = "最后一次写得真漂亮！";
pub const REVIEW_DONE_FEEDBACK: &str = "这个字写得真棒！还要再练习一下吗？";
pub const ALL_COMPLETE_FEEDBACK: &str = "太棒了！你已经完成了所有关卡！";
pub const RECORDING_FEEDBACK: &str = "正在录音...";
pub const ANALYZING_FEEDBACK: &str = "正在分析你的发音...";
pub const TOO_QUIET_FEEDBACK: &str = "声音太小了，大声一点试试？";
pub const RECORDING_FAILED_FEEDBACK: &str = "录音失败了，请检查麦克风后再试一次。";
pub const PLAYBACK_FAILED_FEEDBACK: &str = "播放失败了，请稍后再试。";

/// Feedback after a non-review pass
pub fn pass_feedback(score: i64, points: i64) -> String {
    if points > 0 {
        if score >= 10 {
            format!("入木三分！破纪录奖励 {} 分！", points)
        } else {
            format!("更上一层楼！奖励 {} 分！", points)
        }
    } else {
        format!("写得不错！（这次得了 {} 分，继续努力破纪录吧！）", score)
    }
}

/// Feedback after a rated pronunciation
pub fn pronunciation_feedback(stars: i64, points: i64) -> String {
    if points > 0 {
        format!("读得真好！获得了 {} 颗星，由于新记录奖励 {} 分！", stars, points)
    } else {
        format!("读得很好！（这次拿了 {} 颗星，由于没破纪录，就不重复给分啦）", stars)
    }
}

/// Prompt shown when a character is presented
pub fn presentation_feedback(glyph: &str, first_word: Option<&str>, review: bool, last_score: i64) -> String {
    if last_score > 0 && !review {
        return format!("上次拿了 {} 分，尝试突破自己吗？", last_score);
    }

    let word = first_word.map(|w| format!("（{}）", w)).unwrap_or_default();
    if review {
        format!("回味一下 '{}' {} 怎么写吧！", glyph, word)
    } else {
        format!("快来写写这个 '{}' {} 字吧！", glyph, word)
    }
}
