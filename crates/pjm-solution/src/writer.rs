//! Solution text writer
//!
//! Untouched nodes are written from their source text, edited or new nodes
//! from the model.

use crate::file::{GlobalBlock, SolutionFile};
use crate::model::{ProjectEntry, Section};

struct Writer<'a> {
    out: String,
    newline: &'a str,
}

impl<'a> Writer<'a> {
    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn line(&mut self, text: &str) {
        // a source line at EOF may lack its terminator
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push_str(self.newline);
        }
        self.out.push_str(text);
        self.out.push_str(self.newline);
    }

    fn section(&mut self, section: &Section, keyword: &str) {
        self.raw(&section.leading_trivia);
        if let Some(raw) = &section.raw {
            self.raw(raw);
            return;
        }
        self.line(&format!(
            "\t{keyword}({}) = {}",
            section.name(),
            section.position().as_str()
        ));
        for (key, value) in section.properties().iter() {
            self.line(&format!("\t\t{key} = {value}"));
        }
        self.line(&format!("\tEnd{keyword}"));
    }

    fn project(&mut self, entry: &ProjectEntry) {
        self.raw(&entry.leading_trivia);
        match &entry.raw_open {
            Some(raw) => self.raw(raw),
            None => self.line(&format!(
                "Project(\"{}\") = \"{}\", \"{}\", \"{}\"",
                entry.type_id(),
                entry.name(),
                entry.relative_file_path(),
                entry.id()
            )),
        }
        for section in entry.sections() {
            self.section(section, "ProjectSection");
        }
        self.raw(&entry.trailing_trivia);
        match &entry.raw_close {
            Some(raw) => self.raw(raw),
            None => self.line("EndProject"),
        }
    }

    fn global(&mut self, block: &GlobalBlock) {
        self.raw(&block.leading_trivia);
        match &block.raw_open {
            Some(raw) => self.raw(raw),
            None => self.line("Global"),
        }
        for section in &block.sections {
            self.section(section, "GlobalSection");
        }
        self.raw(&block.trailing_trivia);
        match &block.raw_close {
            Some(raw) => self.raw(raw),
            None => self.line("EndGlobal"),
        }
    }
}

/// Render a solution file to text
pub(crate) fn render(file: &SolutionFile) -> String {
    let mut writer = Writer {
        out: String::new(),
        newline: file.line_ending.as_str(),
    };
    file.header.write_into(&mut writer.out);
    for entry in &file.projects {
        writer.project(entry);
    }
    if let Some(global) = &file.global {
        writer.global(global);
    }
    writer.raw(&file.trailer);
    writer.out
}
