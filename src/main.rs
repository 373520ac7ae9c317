use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use serenity::{
    async_trait,
    client::{Client, EventHandler},
    framework::{
        standard::{
            Args, CommandResult,
            macros::{command, group},
        },
        StandardFramework,
    },
    model::{channel::Message, gateway::Ready},
    prelude::GatewayIntents,
    Result as SerenityResult,
};
use serenity::client::Context;
use serenity::framework::standard::CommandError;
use serenity::model::channel::ReactionType::{self, Unicode};
use serenity::model::guild::Guild;
use serenity::model::id::{ChannelId, UserId};
use serenity::model::prelude::{GuildId, VoiceState};
use songbird::{Call, Event, EventContext, EventHandler as VoiceEventHandler, SerenityInit, TrackEvent, ytdl};
use songbird::tracks::{PlayMode, TrackHandle};
use tokio::sync::Mutex;
use tracing::{info, info_span, warn};
use tracing_futures::Instrument;

use jukebox_bot::config::Config;
use jukebox_bot::driver::PlaybackDriver;
use jukebox_bot::error::{MusicError, MusicResult};
use jukebox_bot::models::{PlayTicket, RepeatMode, Track, TrackEndReason};
use jukebox_bot::player::{EndOutcome, Player};
use jukebox_bot::registry::SessionRegistry;
use jukebox_bot::render;
use jukebox_bot::selection::{self, Settled};
use jukebox_bot::source::{TrackSource, YtDlpSource};

type GuildPlayer = Player<SongbirdDriver>;

struct Handler;

pub struct ServersManager;

impl serenity::prelude::TypeMapKey for ServersManager {
    type Value = SessionRegistry<GuildPlayer>;
}

pub struct BotDataMap;

pub struct BotData {
    pub id: u64,
}

impl serenity::prelude::TypeMapKey for BotDataMap {
    type Value = BotData;
}

pub struct SettingsKey;

impl serenity::prelude::TypeMapKey for SettingsKey {
    type Value = Arc<Settings>;
}

pub struct Settings {
    pub config: Config,
    pub source: YtDlpSource,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let bot_data = BotData { id: ready.user.id.0 };
        let data = &mut ctx.data.write().await;
        data.insert::<BotDataMap>(bot_data);
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let guild_id = match new.guild_id {
            Some(guild_id) => guild_id,
            None => return,
        };

        let bot_id = get_bot_id(&ctx).await;

        if Some(new.user_id.0) == bot_id {
            if new.channel_id.is_none() {
                info!("Bot was disconnected from voice in guild {}", guild_id.0);
                teardown_player(&ctx, guild_id).await;
            }
            return;
        }

        let left_channel = match old.and_then(|old| old.channel_id) {
            Some(channel) if new.channel_id != Some(channel) => channel,
            _ => return,
        };

        if let Some(bot_id) = bot_id {
            if is_abandoned(&ctx, guild_id, left_channel, UserId(bot_id)) {
                info!("Last listener left channel {} in guild {}", left_channel.0, guild_id.0);

                teardown_player(&ctx, guild_id).await;

                if let Some(manager) = songbird::get(&ctx).await {
                    if let Err(why) = manager.remove(guild_id).await {
                        warn!("Could not leave voice channel: {why:?}");
                    }
                }
            }
        }
    }
}

/// True when the bot sits in `channel` with no human left beside it.
fn is_abandoned(ctx: &Context, guild_id: GuildId, channel: ChannelId, bot_id: UserId) -> bool {
    let guild = match ctx.cache.guild(guild_id) {
        Some(guild) => guild,
        None => return false,
    };

    let bot_channel = guild.voice_states.get(&bot_id).and_then(|state| state.channel_id);
    if bot_channel != Some(channel) {
        return false;
    }

    !guild
        .voice_states
        .values()
        .filter(|state| state.channel_id == Some(channel))
        .any(|state| {
            let is_bot = state
                .member
                .as_ref()
                .map(|member| member.user.bot)
                .or_else(|| ctx.cache.user(state.user_id).map(|user| user.bot))
                .unwrap_or(false);

            !is_bot
        })
}

#[group]
#[commands(join, leave, play, pause, resume, stop, skip, previous, queue, shuffle, repeat, volume, help)]
struct General;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if dotenv().is_err() {
        info!(".env file not found, using the process environment");
    }

    let config = Config::from_env().expect("Invalid bot configuration");

    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix(&config.prefix)
        })
        .group(&GENERAL_GROUP);

    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.token, intents)
        .event_handler(Handler)
        .framework(framework)
        .register_songbird()
        .await
        .expect("Err creating client");

    {
        let mut w = client.data.write().await;

        let source = YtDlpSource::new(config.ytdlp_path.clone(), config.search_candidates);

        w.insert::<ServersManager>(SessionRegistry::new());
        w.insert::<SettingsKey>(Arc::new(Settings { config, source }));
    }

    tokio::spawn(
        async move {
            let _ = client.start().await.map_err(|why| info!("Client ended: {why:?}"));
        }
        .instrument(info_span!("gateway")),
    );

    tokio::signal::ctrl_c().await.expect("Control-C interruption failed!");

    info!("Received Ctrl-C, shutting down.");
}

#[command]
#[only_in(guilds)]
async fn join(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    if get_player(ctx, guild_id).await.is_some() {
        say_error(ctx, msg.channel_id, &MusicError::AlreadyConnectedToChannel).await;
        return Ok(());
    }

    get_or_create_player(ctx, msg, guild_id).await?;

    check_msg(msg.channel_id.say(&ctx.http, "Joined your voice channel").await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn leave(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    teardown_player(ctx, guild_id).await;
    leave_current_channel(ctx, msg).await
}

#[command]
#[only_in(guilds)]
async fn play(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    play_song_with_reaction(ctx, msg, args).await
}

#[command]
#[only_in(guilds)]
async fn help(ctx: &Context, msg: &Message) -> CommandResult {
    let message = r#"
**Commands:**
    **join** - Joins your voice channel.
    **leave** - Clears the queue and leaves the voice channel.
    **play [URL|Title]** - Plays (or adds to the queue) tracks given a URL or a title (supports youtube playlists).
    **pause** - Pauses the current track.
    **resume** - Resumes the paused track.
    **stop** - Stops the current track and clears the queue.
    **skip** - Plays the next track.
    **previous** - Plays the previous track again.
    **queue** - Shows the current track and what comes next.
    **shuffle** - Reorders the upcoming tracks randomly.
    **loop [none|one|all]** - Repeats nothing, the current track or the whole queue.
    **volume [0-100]** - Sets the playback volume.
    "#;

    check_msg(msg.channel_id.say(&ctx.http, message).await);

    Ok(())
}

async fn play_song_with_reaction(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let bot_id = get_bot_id(ctx).await;

    let loading_emoji = Unicode("⏳".to_string());

    msg.react(&ctx.http, loading_emoji.clone()).await?;

    let play_song_result = play_song(ctx, msg, args).await;

    if let Some(bot_id) = bot_id {
        msg.channel_id.delete_reaction(&ctx.http, msg.id, Some(UserId(bot_id)), loading_emoji.clone()).await?;
    }

    let answer_emoji = match play_song_result {
        Ok(_) => {
            "👍"
        }
        Err(_) => {
            "💀"
        }
    };

    msg.react(&ctx.http, Unicode(answer_emoji.to_string())).await?;

    Ok(())
}

async fn play_song(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let user_input = args.message().trim();

    if user_input.is_empty() {
        check_msg(msg.channel_id.say(&ctx.http, "Usage: play [URL|Title]").await);
        return Err(CommandError::from("Missing query"));
    }

    info!("User input is {user_input}");

    let guild_id = get_guild_id(ctx, msg)?;
    let requested_for = get_or_create_player(ctx, msg, guild_id).await?;
    let settings = get_settings(ctx).await?;

    let resolution = match settings.source.resolve(user_input).await {
        Ok(resolution) => resolution,
        Err(why) => {
            say_error(ctx, msg.channel_id, &why).await;
            return Err(why.into());
        }
    };

    let tracks = match selection::settle(resolution) {
        Settled::Ready(tracks) => tracks,
        Settled::Choose(candidates) => match choose_track(ctx, msg, &candidates, settings.config.selection_timeout).await {
            Some(track) => vec![track],
            None => {
                check_msg(msg.channel_id.say(&ctx.http, "No song was chosen").await);
                return Ok(());
            }
        },
        Settled::Nothing => {
            say_error(ctx, msg.channel_id, &MusicError::NoTracksFound).await;
            return Err(MusicError::NoTracksFound.into());
        }
    };

    // The player may have been torn down while the lookup or the prompt was pending.
    let player_lock = match get_player(ctx, guild_id).await {
        Some(player_lock) if Arc::ptr_eq(&player_lock, &requested_for) => player_lock,
        _ => {
            info!("Discarding {} resolved track(s) for a torn down player", tracks.len());
            return Ok(());
        }
    };

    let added = tracks.len();
    let mut player = player_lock.lock().await;

    match player.add_tracks(tracks).await {
        Ok(Some(track)) => check_msg(msg.channel_id.say(&ctx.http, render::now_playing(&track)).await),
        Ok(None) => check_msg(
            msg.channel_id
                .say(&ctx.http, format!("Added {added} song(s) to the queue ({} in total)", player.session().len()))
                .await,
        ),
        Err(why) => {
            say_error(ctx, msg.channel_id, &why).await;
            return Err(why.into());
        }
    }

    Ok(())
}

/// Shows up to five candidates and waits for the author to react with one.
async fn choose_track(ctx: &Context, msg: &Message, candidates: &[Track], timeout: Duration) -> Option<Track> {
    let prompt = match msg.channel_id.say(&ctx.http, render::selection_prompt(candidates)).await {
        Ok(prompt) => prompt,
        Err(why) => {
            info!("Error sending message: {why:?}");
            return None;
        }
    };

    for emoji in selection::options_for(candidates.len()) {
        if let Err(why) = prompt.react(&ctx.http, Unicode(emoji.to_string())).await {
            info!("Could not add option {emoji}: {why:?}");
        }
    }

    let pick = async {
        let action = prompt
            .await_reaction(ctx)
            .author_id(msg.author.id)
            .filter(|reaction| option_from_reaction(&reaction.emoji).is_some())
            .await;

        action.and_then(|action| option_from_reaction(&action.as_inner_ref().emoji))
    };

    let chosen = selection::choose(candidates, pick, timeout).await;

    if let Err(why) = prompt.delete(ctx).await {
        info!("Could not delete selection prompt: {why:?}");
    }

    chosen
}

fn option_from_reaction(emoji: &ReactionType) -> Option<usize> {
    match emoji {
        Unicode(emoji) => selection::option_index(emoji),
        _ => None,
    }
}

#[command]
#[only_in(guilds)]
async fn pause(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;
    let player_lock = require_player(ctx, msg, guild_id).await?;

    let result = player_lock.lock().await.pause().await;
    report(ctx, msg, result, "Paused the song").await
}

#[command]
#[only_in(guilds)]
async fn resume(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;
    let player_lock = require_player(ctx, msg, guild_id).await?;

    let result = player_lock.lock().await.resume().await;
    report(ctx, msg, result, "Resumed the song").await
}

#[command]
#[only_in(guilds)]
async fn stop(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;
    let player_lock = require_player(ctx, msg, guild_id).await?;

    let result = player_lock.lock().await.stop().await;
    report(ctx, msg, result, "Stopped the player and cleared the queue").await
}

#[command]
#[only_in(guilds)]
async fn skip(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    info!("SKIP - Skip command invoked from guild {}!", guild_id.0);

    let player_lock = require_player(ctx, msg, guild_id).await?;
    let result = player_lock.lock().await.skip().await;

    match result {
        Ok(Some(track)) => check_msg(msg.channel_id.say(&ctx.http, render::now_playing(&track)).await),
        Ok(None) => check_msg(msg.channel_id.say(&ctx.http, "That was the last song in the queue").await),
        Err(why) => say_error(ctx, msg.channel_id, &why).await,
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn previous(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;
    let player_lock = require_player(ctx, msg, guild_id).await?;

    let result = player_lock.lock().await.previous().await;

    match result {
        Ok(track) => check_msg(msg.channel_id.say(&ctx.http, render::now_playing(&track)).await),
        Err(why) => say_error(ctx, msg.channel_id, &why).await,
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn queue(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;
    let limit = get_settings(ctx).await?.config.queue_display_limit;

    let summary = match get_player(ctx, guild_id).await {
        Some(player_lock) => {
            let player = player_lock.lock().await;

            render::queue_summary(player.session(), limit)
                .map(|summary| format!("{summary}\n{}", render::playback_status(player.volume(), player.is_paused())))
                .map_err(MusicError::from)
        }
        None => Err(MusicError::NothingPlaying),
    };

    match summary {
        Ok(summary) => check_msg(msg.channel_id.say(&ctx.http, summary).await),
        Err(why) => say_error(ctx, msg.channel_id, &why).await,
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn shuffle(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    info!("Shuffle - Shuffle command invoked from guild {}!", guild_id.0);

    let player_lock = require_player(ctx, msg, guild_id).await?;
    let result = player_lock.lock().await.shuffle();

    match result {
        Ok(()) => msg.react(&ctx.http, Unicode("👍".to_string())).await.map(|_| ())?,
        Err(why) => say_error(ctx, msg.channel_id, &why).await,
    }

    Ok(())
}

#[command]
#[aliases("loop")]
#[only_in(guilds)]
async fn repeat(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    let mode = match args.message().parse::<RepeatMode>() {
        Ok(mode) => mode,
        Err(why) => {
            say_error(ctx, msg.channel_id, &why).await;
            return Ok(());
        }
    };

    let player_lock = require_player(ctx, msg, guild_id).await?;
    player_lock.lock().await.set_repeat_mode(mode);

    check_msg(msg.channel_id.say(&ctx.http, format!("Repeat mode set to {mode}")).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn volume(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    let percent = match args.single::<i64>() {
        Ok(percent) => percent,
        Err(_) => {
            check_msg(msg.channel_id.say(&ctx.http, "Give a volume between 0 and 100").await);
            return Ok(());
        }
    };

    let player_lock = require_player(ctx, msg, guild_id).await?;
    let result = player_lock.lock().await.set_volume(percent).await;

    report(ctx, msg, result, &format!("Volume set to {percent}%")).await
}

async fn report(ctx: &Context, msg: &Message, result: MusicResult<()>, done: &str) -> CommandResult {
    match result {
        Ok(()) => check_msg(msg.channel_id.say(&ctx.http, done).await),
        Err(why) => say_error(ctx, msg.channel_id, &why).await,
    }

    Ok(())
}

async fn say_error(ctx: &Context, channel_id: ChannelId, error: &MusicError) {
    let text = if error.is_queue_empty() {
        "The queue is empty!".to_string()
    } else {
        format!("o_O {}", capitalize(&error.to_string()))
    };

    check_msg(channel_id.say(&ctx.http, text).await);
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

async fn teardown_player(ctx: &Context, guild_id: GuildId) {
    let player_lock = {
        let data = &mut ctx.data.write().await;
        data.get_mut::<ServersManager>().and_then(|servers| servers.remove(guild_id.0))
    };

    if let Some(player_lock) = player_lock {
        if let Err(why) = player_lock.lock().await.teardown().await {
            info!("{:#?}", why)
        }
    }
}

async fn leave_current_channel(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    let manager = get_manager(ctx).await?;

    let has_handler = manager.get(guild_id).is_some();

    if has_handler {
        if let Err(e) = manager.remove(guild_id).await {
            check_msg(msg.channel_id.say(&ctx.http, format!("Failed: {e:?}")).await);
        }

        check_msg(msg.channel_id.say(&ctx.http, "Left the voice channel").await);
    } else {
        check_msg(msg.reply(ctx, "Not in a voice channel").await);
    }

    Ok(())
}

async fn join_voice(ctx: &Context, msg: &Message) -> CommandResult<Arc<Mutex<Call>>> {
    let guild_id = get_guild_id(ctx, msg)?;

    let channel_id = get_guild(ctx, msg)?
        .voice_states.get(&msg.author.id)
        .and_then(|voice_state| voice_state.channel_id);

    let connect_to = match channel_id {
        Some(channel) => channel,
        None => {
            check_msg(msg.reply(ctx, "Not in a voice channel").await);

            return Err(MusicError::NoVoiceChannel.into());
        }
    };

    let manager = get_manager(ctx).await?;

    let (handler_lock, joined) = manager.join(guild_id, connect_to).await;

    if let Err(why) = joined {
        warn!("Could not join voice channel {}: {why:?}", connect_to.0);
        return Err(MusicError::Driver(format!("could not join the voice channel: {why:?}")).into());
    }

    {
        let mut handler = handler_lock.lock().await;

        if handler.is_deaf() {
            info!("Already deafen!")
        } else if let Err(e) = handler.deafen(true).await {
            info!("Deafen failed due to {e:?}")
        }
    }

    Ok(handler_lock)
}

/// Connects to the author's voice channel and returns the guild's player.
async fn get_or_create_player(ctx: &Context, msg: &Message, guild_id: GuildId) -> CommandResult<Arc<Mutex<GuildPlayer>>> {
    if let Some(player_lock) = get_player(ctx, guild_id).await {
        let manager = get_manager(ctx).await?;

        if manager.get(guild_id).is_some() {
            return Ok(player_lock);
        }

        // The call is gone, so the old driver has nothing left to stream into.
        teardown_player(ctx, guild_id).await;
    }

    let call = join_voice(ctx, msg).await?;

    let driver = SongbirdDriver {
        guild_id,
        channel_id: msg.channel_id,
        call,
        track: None,
        volume: 1.0,
        ctx: ctx.clone(),
    };

    let data = &mut ctx.data.write().await;
    let servers = data.get_mut::<ServersManager>().ok_or(CommandError::from("Player registry not found"))?;

    Ok(servers.get_or_insert_with(guild_id.0, || Player::new(driver)))
}

async fn require_player(ctx: &Context, msg: &Message, guild_id: GuildId) -> CommandResult<Arc<Mutex<GuildPlayer>>> {
    match get_player(ctx, guild_id).await {
        Some(player_lock) => Ok(player_lock),
        None => {
            say_error(ctx, msg.channel_id, &MusicError::NothingPlaying).await;
            Err(MusicError::NothingPlaying.into())
        }
    }
}

async fn get_player(ctx: &Context, guild_id: GuildId) -> Option<Arc<Mutex<GuildPlayer>>> {
    let data = ctx.data.read().await;

    data.get::<ServersManager>()?.get(guild_id.0)
}

async fn get_settings(ctx: &Context) -> CommandResult<Arc<Settings>> {
    let data = ctx.data.read().await;

    data.get::<SettingsKey>().cloned().ok_or(CommandError::from("Settings not found"))
}

async fn get_bot_id(ctx: &Context) -> Option<u64> {
    let data = ctx.data.read().await;

    data.get::<BotDataMap>().map(|data| data.id)
}

async fn get_manager(ctx: &Context) -> CommandResult<Arc<songbird::Songbird>> {
    songbird::get(ctx).await.ok_or(CommandError::from("Songbird Voice client placed in at initialisation."))
}

/// Checks that a message successfully sent; if not, then logs why to stdout.
fn check_msg(result: SerenityResult<Message>) {
    if let Err(why) = result {
        info!("Error sending message: {why:?}");
    }
}

fn get_guild(ctx: &Context, msg: &Message) -> CommandResult<Guild> {
    msg.guild(&ctx.cache).ok_or(CommandError::from("Guild not found"))
}

fn get_guild_id(ctx: &Context, msg: &Message) -> CommandResult<GuildId> {
    let guild_id = get_guild(ctx, msg)?.id;

    Ok(guild_id)
}

/// Streams a guild's tracks into its songbird call.
pub struct SongbirdDriver {
    guild_id: GuildId,
    channel_id: ChannelId,
    call: Arc<Mutex<Call>>,
    track: Option<TrackHandle>,
    volume: f32,
    ctx: Context,
}

impl SongbirdDriver {
    fn current(&self) -> MusicResult<&TrackHandle> {
        self.track.as_ref().ok_or(MusicError::NothingPlaying)
    }
}

#[async_trait]
impl PlaybackDriver for SongbirdDriver {
    async fn play(&mut self, track: &Track, ticket: PlayTicket) -> MusicResult<()> {
        let source = ytdl(&track.url)
            .await
            .map_err(|why| MusicError::Driver(format!("could not load {}: {why:?}", track.title)))?;

        let track_handle = {
            let mut handler = self.call.lock().await;

            handler.stop(); // Replaces whatever was playing before
            handler.play_source(source)
        };

        track_handle
            .set_volume(self.volume)
            .map_err(|why| MusicError::Driver(format!("{why:?}")))?;

        track_handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier {
                    guild_id: self.guild_id,
                    channel_id: self.channel_id,
                    ticket,
                    ctx: self.ctx.clone(),
                },
            )
            .map_err(|why| MusicError::Driver(format!("Add event END failed: {why:?}")))?;

        self.track = Some(track_handle);

        Ok(())
    }

    async fn stop(&mut self) -> MusicResult<()> {
        if let Some(track_handle) = self.track.take() {
            // Fails when the track already ended on its own.
            if let Err(why) = track_handle.stop() {
                info!("Stopping finished track: {why:?}");
            }
        }

        Ok(())
    }

    async fn pause(&mut self) -> MusicResult<()> {
        self.current()?
            .pause()
            .map_err(|why| MusicError::Driver(format!("{why:?}")))
    }

    async fn resume(&mut self) -> MusicResult<()> {
        self.current()?
            .play()
            .map_err(|why| MusicError::Driver(format!("{why:?}")))
    }

    async fn set_volume(&mut self, percent: u8) -> MusicResult<()> {
        self.volume = f32::from(percent) / 100.0;

        if let Some(track_handle) = &self.track {
            track_handle
                .set_volume(self.volume)
                .map_err(|why| MusicError::Driver(format!("{why:?}")))?;
        }

        Ok(())
    }
}

struct TrackEndNotifier {
    guild_id: GuildId,
    channel_id: ChannelId,
    ticket: PlayTicket,
    ctx: Context,
}

fn end_reason(mode: &PlayMode) -> TrackEndReason {
    match mode {
        PlayMode::End => TrackEndReason::Finished,
        PlayMode::Stop => TrackEndReason::Stopped,
        _ => TrackEndReason::Errored,
    }
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let reason = match ctx {
            EventContext::Track(tracks) => tracks
                .first()
                .map(|(state, _)| end_reason(&state.playing))
                .unwrap_or(TrackEndReason::Finished),
            _ => TrackEndReason::Finished,
        };

        info!("End notifier triggered for {:?}", self.ticket);

        let player_lock = match get_player(&self.ctx, self.guild_id).await {
            Some(player_lock) => player_lock,
            None => return None,
        };

        let outcome = player_lock.lock().await.on_track_end(self.ticket, reason).await;

        match outcome {
            Ok(EndOutcome::Advanced(track)) => {
                check_msg(self.channel_id.say(&self.ctx.http, render::now_playing(&track)).await)
            }
            Ok(_) => {}
            Err(why) => warn!("Could not continue playback: {why}"),
        }

        None
    }
}
