//! Text-to-speech collaborator and spoken prompts
//!
//! Speech is fire-and-forget: the core hands over text and never waits on
//! the engine. Pacing after speech is the session's job.

use hanzi_common::db::Character;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

/// Text-to-speech output
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str);
}

/// Speech sink that only logs what would be spoken
///
/// Used when no engine is attached; clients speak the text they receive as
/// feedback events instead.
#[derive(Debug, Default)]
pub struct LoggingSpeech;

impl SpeechOutput for LoggingSpeech {
    fn speak(&self, text: &str) {
        info!(target: "hanzi_tutor::speech", "speak: {}", text);
    }
}

/// Encouragement spoken after a pass
pub const REWARD_PHRASES: &[&str] = &[
    "你真棒！",
    "太厉害了！",
    "写的真漂亮！",
    "简直是小书法家！",
    "进步真大，为你点赞！",
    "太完美了，继续加油！",
    "你真是一门心思学好汉字！",
    "你的字越来越有灵气了！",
    "卓越的表现，你是最棒的！",
    "看你的字真是一种享受！",
    "哇，写的太工整了！",
    "你真是个汉字小达人！",
];

/// Idioms and phrases used when a character has no example words
const FALLBACK_WORDS: &[(&str, &str)] = &[
    ("一", "一心一意"), ("二", "二龙戏珠"), ("三", "三省吾身"), ("十", "十全十美"), ("上", "蒸蒸日上"), ("下", "下笔成章"),
    ("左", "左右逢源"), ("右", "无出其右"), ("中", "中流砥柱"), ("大", "大展宏图"), ("小", "小巧玲珑"), ("人", "人杰地灵"),
    ("天", "海阔天空"), ("地", "地大物博"), ("日", "日新月异"), ("月", "海上生明月"), ("山", "山高水长"), ("水", "上善若水"),
    ("火", "星星之火"), ("木", "木秀于林"), ("手", "妙手回春"), ("口", "口若悬河"), ("耳", "耳濡目染"), ("目", "目不暇接"),
    ("头", "头角峥嵘"), ("米", "谁知盘中餐，粒粒皆辛苦"), ("花", "鸟语花香"), ("鸟", "笨鸟先飞"), ("鱼", "鱼跃龙门"),
    ("虫", "雕虫小技"), ("云", "云淡风轻"), ("雨", "风调雨顺"), ("风", "春风化雨"), ("雪", "雪中送炭"), ("春", "春华秋实"),
    ("夏", "夏炉冬扇"), ("秋", "一叶知秋"), ("冬", "冬日夏云"), ("爸", "父爱如山"), ("妈", "母爱如水"), ("我", "忘我奋斗"),
    ("你", "你好"), ("他", "他山之石"), ("好", "好学不倦"), ("见", "见微知著"), ("开", "开卷有益"), ("关", "关怀备至"),
    ("来", "继往开来"), ("去", "去伪存真"), ("坐", "坐怀不乱"), ("走", "走马观花"), ("听", "兼听则明"), ("说", "说一不二"),
    ("读", "读万卷书"), ("写", "妙笔生花"), ("看", "看破红尘"), ("爱", "爱屋及乌"), ("家", "诗礼传家"), ("校", "学校"),
    ("书", "书山有路"), ("万", "万紫千红"), ("紫", "万紫千红"), ("红", "万紫千红"), ("千", "万紫千红"), ("举", "举一反三"),
    ("反", "举一反三"), ("什", "什么"), ("么", "什么"), ("学", "学而不厌"), ("温", "温故知新"), ("故", "温故知新"),
    ("知", "温故知新"), ("新", "温故知新"), ("先", "笨鸟先飞"), ("勤", "勤能补拙"), ("拙", "勤能补拙"), ("专", "专心致志"),
    ("致", "专心致志"), ("志", "专心致志"), ("全", "全神贯注"), ("神", "全神贯注"), ("贯", "全神贯注"), ("注", "全神贯注"),
    ("融", "融会贯通"), ("通", "融会贯通"), ("止", "学无止境"), ("诚", "诚实守信"), ("信", "诚实守信"), ("助", "助人为乐"),
    ("勇", "勇往直前"), ("正", "正直无私"), ("宽", "宽宏大量"), ("忠", "忠心耿耿"), ("智", "智勇双全"), ("足", "足智多谋"),
    ("谋", "足智多谋"), ("深", "深谋远虑"), ("虑", "深谋远虑"), ("明", "明察秋毫"), ("察", "明察秋毫"), ("分", "争分夺秒"),
    ("秒", "争分夺秒"), ("精", "精益求精"), ("益", "精益求精"), ("恒", "持之以恒"), ("星", "月明星稀"), ("稀", "月明星稀"),
    ("箭", "光阴似箭"), ("合", "志同道合"), ("同", "形影不离"), ("形", "形影不离"), ("影", "形影不离"), ("戒", "戒骄戒躁"),
    ("躁", "戒骄戒躁"), ("威", "威风凛凛"), ("凛", "威风凛凛"), ("盛", "繁荣昌盛"), ("繁", "繁荣昌盛"), ("荣", "繁荣昌盛"),
    ("昌", "繁荣昌盛"), ("盈", "热泪盈眶"), ("眶", "热泪盈眶"), ("澄", "波光粼粼"), ("粼", "波光粼粼"), ("滴", "水滴石穿"),
    ("艘", "一艘帆船"), ("帆", "一艘帆船"), ("航", "航向大海"), ("海", "航向大海"), ("艺", "多才多艺"), ("良", "良师益友"),
    ("艰", "艰苦奋斗"), ("奋", "艰苦奋斗"), ("斗", "艰苦奋斗"), ("凤", "龙飞凤舞"), ("舞", "龙飞凤舞"), ("凡", "不同凡响"),
    ("处", "处变不惊"), ("惊", "处变不惊"), ("够", "足够多"), ("美", "美不胜收"), ("胜", "美不胜收"), ("收", "美不胜收"),
    ("画", "如诗如画"), ("诗", "如诗如画"), ("金", "金榜题名"), ("榜", "金榜题名"), ("题", "金榜题名"), ("名", "金榜题名"),
];

/// Pick a random reward phrase
pub fn reward_phrase<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    REWARD_PHRASES.choose(rng).copied().unwrap_or("你真棒！")
}

/// Built-in phrase for a glyph, if any
pub fn fallback_word(glyph: &str) -> Option<&'static str> {
    FALLBACK_WORDS
        .iter()
        .find(|(key, _)| *key == glyph)
        .map(|(_, word)| *word)
}

/// Text spoken to pronounce a character in context
///
/// Uses the first example word, else the built-in phrase table, else the
/// glyph alone. Long phrases (lines of poetry) are quoted.
pub fn pronunciation_text(character: &Character) -> String {
    let glyph = character.id.as_str();
    let word = character
        .example_words
        .first()
        .map(String::as_str)
        .or_else(|| fallback_word(glyph))
        .unwrap_or(glyph);

    if word == glyph {
        glyph.to_string()
    } else if word.chars().count() > 4 {
        format!("{}，“{}”的{}", glyph, word, glyph)
    } else if word.contains(glyph) {
        format!("{}，{}", glyph, word)
    } else {
        format!("{}，比如{}", glyph, word)
    }
}
