use super::{ChatMessage, CommandSource, GeneratedCommand};
use crate::cache::{CommandCache, QueryContext};
use anyhow::Result;
use log::debug;

pub struct Generation {
    pub commands: Vec<GeneratedCommand>,
    pub from_cache: bool,
}

/// Puts the command cache in front of a command source.
pub struct CommandGenerator<S: CommandSource> {
    source: S,
    cache: CommandCache<GeneratedCommand>,
}

impl<S: CommandSource> CommandGenerator<S> {
    pub fn new(source: S, cache: CommandCache<GeneratedCommand>) -> Self {
        CommandGenerator { source, cache }
    }

    pub fn cache_mut(&mut self) -> &mut CommandCache<GeneratedCommand> {
        &mut self.cache
    }

    /// Commands for `query`, from the cache when possible. With
    /// `bypass_cache` the source is always asked and its answer replaces
    /// whatever was cached.
    pub async fn generate(
        &mut self,
        query: &str,
        context: &QueryContext,
        history: &[ChatMessage],
        bypass_cache: bool,
    ) -> Result<Generation> {
        if !bypass_cache {
            if let Some(commands) = self.cache.get(query, Some(context)) {
                debug!("Using {} cached commands for: {}", commands.len(), query);
                return Ok(Generation {
                    commands,
                    from_cache: true,
                });
            }
        }

        let commands = self.source.generate(query, context, history).await?;
        self.cache.put(query, &commands, Some(context));

        Ok(Generation {
            commands,
            from_cache: false,
        })
    }
}
