pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod rectangle;
    pub mod video_metadata;
    pub mod watermark_config;
}

pub mod scheduling {
    pub mod domain {
        pub mod position_schedule;
    }
}

pub mod geometry {
    pub mod domain {
        pub mod region_geometry;
    }
}

pub mod blurring {
    pub mod domain {
        pub mod feathered_mask;
        pub mod region_blurrer;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod audio_remuxer;
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_audio_remuxer;
        pub mod ffmpeg_reader;
        pub mod ffmpeg_writer;
    }
}

pub mod pipeline {
    pub mod frame_processor;
    pub mod pipeline_executor;
    pub mod remove_watermark_use_case;
    pub mod infrastructure {
        pub mod threaded_pipeline_executor;
    }
}
